#[tokio::main]
async fn main() {
    clinic_scheduler::run().await;
}
