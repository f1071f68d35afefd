use url::{ParseError, Url};

#[derive(thiserror::Error, Debug)]
#[error("URL error")]
pub struct UrlError(#[from] ParseError);

pub fn parse_url(url: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url)?;
    Ok(url)
}

/// Returns the host name of an 'http' or 'https' URL
pub fn get_hostname(url: &str) -> Result<String, UrlError> {
    let hostname = Url::parse(url)?
        .host_str()
        .ok_or(ParseError::EmptyHost)?
        .to_string();
    Ok(hostname)
}

/// Returns URL host with port number if present
pub fn get_host(url: &str) -> Result<String, UrlError> {
    let url = Url::parse(url)?;
    let hostname = url.host_str().ok_or(ParseError::EmptyHost)?;
    let host = if let Some(port) = url.port() {
        format!("{}:{}", hostname, port)
    } else {
        hostname.to_string()
    };
    Ok(host)
}

pub fn is_same_origin(url_1: &str, url_2: &str) -> Result<bool, UrlError> {
    let origin_1 = Url::parse(url_1)?.origin();
    let origin_2 = Url::parse(url_2)?.origin();
    Ok(origin_1 == origin_2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_hostname() {
        let url = "https://social.example/objects/1";
        assert_eq!(get_hostname(url).unwrap(), "social.example");
    }

    #[test]
    fn test_get_hostname_with_port() {
        let url = "http://127.0.0.1:8380/objects/1";
        assert_eq!(get_hostname(url).unwrap(), "127.0.0.1");
        assert_eq!(get_host(url).unwrap(), "127.0.0.1:8380");
    }

    #[test]
    fn test_get_hostname_invalid_url() {
        let url = "not-an-url";
        assert_eq!(get_hostname(url).is_err(), true);
    }

    #[test]
    fn test_is_same_origin() {
        let url_1 = "https://social.example/users/1";
        let url_2 = "https://social.example/users/2";
        let url_3 = "https://other.example/users/1";
        assert_eq!(is_same_origin(url_1, url_2).unwrap(), true);
        assert_eq!(is_same_origin(url_1, url_3).unwrap(), false);
    }
}
