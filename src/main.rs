#[tokio::main]
async fn main() {
    let code = mcp_bridge_lib::run().await;
    // Exit here: the runtime would otherwise wait on the blocked stdin reader.
    std::process::exit(code);
}
