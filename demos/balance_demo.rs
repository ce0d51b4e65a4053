use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    screening::example_apps::run_balance_demo(std::env::args().skip(1))
}
