//! Build script for the catalog API
//!
//! Compiles the Protocol Buffer definitions into Rust code. The generated
//! code provides the gRPC service trait and the message types.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_prost_build::configure()
        // Generate server code (we're implementing the service)
        .build_server(true)
        // Generate client code (used by the gRPC tests)
        .build_client(true)
        .compile_protos(&["proto/catalog.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/catalog.proto");

    Ok(())
}
