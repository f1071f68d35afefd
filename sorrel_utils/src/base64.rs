use base64::{
    engine::general_purpose::STANDARD as BASE64_ENGINE,
    Engine as _,
};

pub use base64::DecodeError;

pub fn encode(data: impl AsRef<[u8]>) -> String {
    BASE64_ENGINE.encode(data)
}

pub fn decode(data: impl AsRef<[u8]>) -> Result<Vec<u8>, DecodeError> {
    BASE64_ENGINE.decode(data)
}
