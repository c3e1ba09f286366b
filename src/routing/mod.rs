mod path;
mod router;
mod routes;

pub use path::{param, PathParams};
pub use router::{
    dispatch, handler_fn, AppRouter, GroupMiddleware, Route, RouteGroup, RouteHandler,
    RouterBuilder,
};
pub use routes::setup_routes;
