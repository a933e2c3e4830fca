use enrollment_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("enrollment error: {err}");
        std::process::exit(1);
    }
}
