#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    reelhouse::ReelhouseConfiguration::build_default()?
        .install_tracing()?
        .install_metrics()?
        .run()
        .await
}
