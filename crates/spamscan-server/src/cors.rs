//! Permissive CORS: any origin, method and header, credentials allowed.
//!
//! Browsers reject `*` together with credentials, so the request's own
//! `Origin` and requested headers are echoed back when present.

use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::{Request, Response, Route};

pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let origin = req.headers().get_one("Origin").unwrap_or("*").to_string();
        let allow_headers = req
            .headers()
            .get_one("Access-Control-Request-Headers")
            .unwrap_or("*")
            .to_string();

        res.set_header(Header::new("Access-Control-Allow-Origin", origin));
        res.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
        res.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, PATCH, DELETE, OPTIONS",
        ));
        res.set_header(Header::new("Access-Control-Allow-Headers", allow_headers));
        res.set_header(Header::new("Vary", "Origin"));
    }
}

#[options("/<_..>")]
fn preflight() -> Status {
    Status::NoContent
}

pub fn routes() -> Vec<Route> {
    routes![preflight]
}
