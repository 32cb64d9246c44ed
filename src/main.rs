#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rbxmx_to_rojo::run().await
}
