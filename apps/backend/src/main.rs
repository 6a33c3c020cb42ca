#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ebook_backend::run().await
}
