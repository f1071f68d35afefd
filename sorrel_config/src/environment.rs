use std::str::FromStr;

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl FromStr for Environment {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let environment = match value {
            "development" => Self::Development,
            "production" => Self::Production,
            _ => return Err("invalid environment type"),
        };
        Ok(environment)
    }
}
