// 构建脚本: 编译 gRPC 协议定义
fn main() -> Result<(), Box<dyn std::error::Error>> {
    std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    tonic_build::compile_protos("proto/sentinel.proto")?;
    Ok(())
}
