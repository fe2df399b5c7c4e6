pub fn run() {
    println!("{} {}", inkpost_core::SERVICE_NAME, inkpost_core::version());
}
