fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_build::compile_protos("proto/driver.proto")?;
    println!("cargo:rerun-if-changed=proto/driver.proto");
    Ok(())
}
