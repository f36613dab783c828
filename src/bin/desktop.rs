#[tokio::main]
async fn main() {
    if let Err(err) = equipment_visualizer_lib::run_desktop().await {
        eprintln!("desktop: {}", err);
        std::process::exit(1);
    }
}
