use std::sync::Arc;

#[tokio::main]
async fn main() {
    if let Err(e) = bobo_rs::cli::run(Arc::new(bobo_calc::app)).await {
        eprintln!("bobo-calc: {e}");
        std::process::exit(1);
    }
}
