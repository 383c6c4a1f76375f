pub mod greeting;

pub fn run(name: &str) -> String {
    greeting::greet(name)
}
