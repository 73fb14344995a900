//! Page routes behind the identity provider's middleware.

use crate::models::{EndpointSpec, Shape};
use crate::run_log::RunLog;
use crate::suites::Context;

pub const SIGN_IN: &str = "/sign-in";

const PUBLIC_ROUTES: [&str; 3] = ["/", "/sign-in", "/sign-up"];
const PROTECTED_ROUTES: [&str; 3] = ["/dashboard", "/transactions", "/accounts"];

pub fn endpoints() -> Vec<EndpointSpec> {
    let public = PUBLIC_ROUTES.iter().map(|route| {
        EndpointSpec::page(format!("Middleware - Public Route {}", route), *route)
            .statuses(&[200, 302])
            .critical()
    });
    let protected = PROTECTED_ROUTES.iter().map(|route| {
        EndpointSpec::page(format!("Middleware - Protected Route {}", route), *route)
            .expect(Shape::Redirect {
                location_contains: SIGN_IN,
            })
            .critical()
    });
    public.chain(protected).collect()
}

pub async fn run(ctx: &Context, log: &mut RunLog) {
    for spec in endpoints() {
        ctx.check(&spec, log).await;
    }
}
