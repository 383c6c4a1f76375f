/// Say hello to `name`.
pub fn greet(name: &str) -> String {
    format!("Hello, {name}!")
}

pub struct Greeter {
    pub default_name: String,
}

impl Greeter {
    pub fn new(default_name: String) -> Self {
        Self { default_name }
    }

    pub fn greet_default(&self) -> String {
        greet(&self.default_name)
    }
}
