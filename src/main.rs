#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    procuracao_server::run().await
}
