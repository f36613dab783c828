#[actix_web::main]
async fn main() {
    if let Err(err) = equipment_visualizer_lib::run().await {
        eprintln!("equipment-visualizer: {}", err);
        std::process::exit(1);
    }
}
