#[tokio::main]
async fn main() -> anyhow::Result<()> {
    foodgram::start_server().await
}
