use smartdiet_push_relay::start_web_server;

#[tokio::main]
async fn main() {
    if let Err(err) = start_web_server().await {
        tracing::error!("relay stopped: {err:?}");
        eprintln!("relay stopped: {err:?}");
        std::process::exit(1);
    }
}
