pub mod connctx;
pub mod hub;
