//! Regenerates `src/types.rs` from `proto/vss.proto` when built with the
//! `genproto` cfg (`RUSTFLAGS='--cfg genproto' cargo build -p api`).
//!
//! Normal builds use the hand-maintained, checked-in `src/types.rs` and
//! never invoke `protoc`, so the crate has no mandatory build-time
//! dependency on a system protobuf compiler.

fn main() {
	#[cfg(genproto)]
	{
		println!("cargo:rerun-if-changed=proto/vss.proto");
		prost_build::Config::new()
			.bytes(["."])
			.out_dir("src")
			.compile_protos(&["proto/vss.proto"], &["proto"])
			.expect("failed to compile proto/vss.proto");
	}
	#[cfg(not(genproto))]
	{
		println!("cargo:rerun-if-changed=proto/vss.proto");
	}
}
