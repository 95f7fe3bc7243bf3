//! RPC-style request signing for the Aliyun OpenAPI.
//!
//! Every call is a GET whose query string carries the API parameters plus a
//! `Signature` computed as HMAC-SHA1 over a canonicalized form of that query:
//!
//! 1. sort parameters by key,
//! 2. percent-encode keys and values per RFC 3986 (unreserved = `A-Za-z0-9-_.~`),
//! 3. join as `k=v` pairs with `&`,
//! 4. sign `GET&%2F&<encoded canonical query>` with key `<secret>&`,
//! 5. base64 the 20-byte digest.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha1::{Digest, Sha1};

/// Percent-encodes `input` the way the vendor's signature algorithm expects.
///
/// Built on the form-urlencoded serializer and then adjusted: spaces become
/// `%20` rather than `+`, `*` is encoded, `~` is not.
pub fn percent_encode(input: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(input.as_bytes()).collect();
    encoded
        .replace('+', "%20")
        .replace('*', "%2A")
        .replace("%7E", "~")
}

/// Builds the sorted, encoded `k=v&...` canonical query string.
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Builds the string that gets signed.
pub fn string_to_sign(method: &str, canonical: &str) -> String {
    format!("{method}&%2F&{}", percent_encode(canonical))
}

/// Computes the base64 signature for `params` with the account secret.
pub fn signature(params: &BTreeMap<String, String>, access_key_secret: &str) -> String {
    let to_sign = string_to_sign("GET", &canonical_query(params));
    let key = format!("{access_key_secret}&");
    BASE64.encode(hmac_sha1(key.as_bytes(), to_sign.as_bytes()))
}

/// HMAC-SHA1 over `data` with `key`, built directly on the sha1 crate.
pub fn hmac_sha1(key: &[u8], data: &[u8]) -> [u8; 20] {
    const BLOCK_SIZE: usize = 64;

    let mut key_block = [0u8; BLOCK_SIZE];
    if key.len() > BLOCK_SIZE {
        let mut hasher = Sha1::new();
        hasher.update(key);
        key_block[..20].copy_from_slice(&hasher.finalize());
    } else {
        key_block[..key.len()].copy_from_slice(key);
    }

    let mut inner_key = [0x36u8; BLOCK_SIZE];
    let mut outer_key = [0x5cu8; BLOCK_SIZE];
    for i in 0..BLOCK_SIZE {
        inner_key[i] ^= key_block[i];
        outer_key[i] ^= key_block[i];
    }

    let mut inner = Sha1::new();
    inner.update(inner_key);
    inner.update(data);

    let mut outer = Sha1::new();
    outer.update(outer_key);
    outer.update(inner.finalize());

    outer.finalize().into()
}
