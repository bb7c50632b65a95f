use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Method, Status};
use rocket::{Request, Response};
use std::collections::HashSet;

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// Adds CORS headers for origins on the allow-list. `*` on the list admits
/// any origin.
pub struct OriginHeader {
    pub allowed_domains: HashSet<String>,
}

impl OriginHeader {
    fn allows(&self, origin: &str) -> bool {
        self.allowed_domains.contains("*")
            || self
                .allowed_domains
                .contains(origin.trim_end_matches('/'))
    }
}

#[rocket::async_trait]
impl Fairing for OriginHeader {
    fn info(&self) -> Info {
        Info {
            name: "Loyalty CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        // a preflight for an unknown path still needs its headers
        if response.status() == Status::NotFound && request.method() != Method::Options {
            return;
        }
        let origin = match request.headers().get_one("Origin") {
            Some(origin) if self.allows(origin) => origin.to_owned(),
            _ => return,
        };

        response.set_header(Header::new("Access-Control-Allow-Origin", origin));
        response.set_header(Header::new("Access-Control-Allow-Methods", ALLOWED_METHODS));
        response.set_header(Header::new("Access-Control-Allow-Headers", ALLOWED_HEADERS));
        response.set_header(Header::new("Vary", "Origin"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(domains: &[&str]) -> OriginHeader {
        OriginHeader {
            allowed_domains: domains.iter().map(|domain| domain.to_string()).collect(),
        }
    }

    #[test]
    fn allow_list() {
        let cors = policy(&["https://primos.games"]);
        assert!(cors.allows("https://primos.games"));
        assert!(cors.allows("https://primos.games/"));
        assert!(!cors.allows("https://evil.example"));
        assert!(policy(&["*"]).allows("http://localhost:3000"));
    }
}
