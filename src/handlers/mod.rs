// Route handlers, split by whether the bearer-token middleware guards them.
pub mod protected;
pub mod public;
