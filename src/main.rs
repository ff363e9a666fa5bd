#[tokio::main]
async fn main() -> anyhow::Result<()> {
    twbacktest_desktop_lib::run().await
}
