pub mod helpers;
mod tests_flush;
