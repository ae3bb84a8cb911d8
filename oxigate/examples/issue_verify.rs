#![allow(clippy::unwrap_used)]
use oxigate::{
    Algorithm,
    AuthHandle,
    JwtAuth,
    crypto::keygen::KeypairGenerator,
};

// NOTE: Debug is only required for printing in this example code and is not a
// requirement of oxigate.
#[derive(Debug, serde::Deserialize)]
struct Identity {
    sub: String,
    name: String,
}

#[derive(serde::Serialize)]
struct Profile<'a> {
    name: &'a str,
}

fn engine() -> JwtAuth {
    let pair = KeypairGenerator::generate(Algorithm::EdDSA).unwrap();
    JwtAuth::builder(
        pair.signing_key(Algorithm::EdDSA).unwrap(),
        "https://auth.example.org",
        "https://api.example.org",
    )
    .with_base_url("https://auth.example.org")
    .with_expiry(3600)
    .with_leeway(30)
    .build()
    .unwrap()
}

fn main() {
    let handle = AuthHandle::new(engine());
    let verifier = handle.verifier::<Identity>();

    // ANCHOR: login
    let token = handle
        .load()
        .issue_with_claims("user-1", &Profile { name: "Jane" })
        .unwrap();
    // ANCHOR_END: login

    // ANCHOR: request
    let authorization = format!("Bearer {token}");
    let identity = verifier.verify_authorization(Some(&authorization)).unwrap();
    // ANCHOR_END: request
    println!("authenticated {} ({})", identity.sub, identity.name);

    // rotating invalidates tokens signed by the previous key
    handle.rotate(engine());
    let err = verifier.verify_authorization(Some(&authorization)).unwrap_err();
    println!("after rotation: {err} ({:?})", err.kind());
}
