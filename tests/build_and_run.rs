//! Builds sources to image files and runs them back through the public API.

use stackemu::virtual_machine::assembler::{build_file, default_output_path};
use stackemu::virtual_machine::console::StreamConsole;
use stackemu::virtual_machine::errors::{ErrorKind, VMError};
use stackemu::virtual_machine::program::Program;
use stackemu::virtual_machine::vm::VM;
use std::fs;
use std::path::{Path, PathBuf};

fn demo(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

/// Builds `source` in `dir`, runs the image with `input` on stdin, returns stdout.
fn build_and_run(dir: &Path, source: &str, input: &str) -> Result<String, VMError> {
    let src = dir.join("prog.asm");
    fs::write(&src, source).unwrap();
    let image = build_file(&src, None)?;

    let mut vm = VM::new(Program::load_file(&image)?);
    let mut console = StreamConsole::new(input.as_bytes(), Vec::new());
    vm.run(&mut console)?;
    let (_, out) = console.into_inner();
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn add_program_prints_sum() {
    let dir = tempfile::tempdir().unwrap();
    let out = build_and_run(dir.path(), "BEGIN\nPUSH 3\nPUSH 4\nADD\nOUT\nEND\n", "").unwrap();
    assert_eq!(out, "7\n");
}

#[test]
fn divide_by_zero_fails_at_div_line() {
    let dir = tempfile::tempdir().unwrap();
    let err = build_and_run(dir.path(), "BEGIN\nPUSH 5\nPUSH 0\nDIV\nEND\n", "").unwrap_err();
    assert!(matches!(err, VMError::RuntimeError { line: 4, .. }));
    assert_eq!(err.kind(), ErrorKind::Arithmetic);
}

#[test]
fn factorial_demos_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["factorial_loop.asm", "factorial_rec.asm"] {
        let source = fs::read_to_string(demo(name)).unwrap();
        let out = build_and_run(dir.path(), &source, "10\n").unwrap();
        assert_eq!(out, "3628800\n", "{name}");
    }
}

#[test]
fn explicit_output_path() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("echo.asm");
    let image = dir.path().join("out").join("echo.img");
    fs::create_dir(dir.path().join("out")).unwrap();
    fs::write(&src, "BEGIN\nIN\nOUT\nEND\n").unwrap();

    assert_eq!(build_file(&src, Some(image.as_path())).unwrap(), image);
    assert!(!default_output_path(&src).exists());

    let bytes = fs::read(&image).unwrap();
    assert_eq!(
        bytes,
        vec![0x00, 0x00, 0x20, 0x00, 0x21, 0x00, 0x01, 0x00]
    );
}

#[test]
fn build_error_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("bad.asm");
    fs::write(&src, "BEGIN\nPUSH 1 2\nEND\n").unwrap();

    let err = build_file(&src, None).unwrap_err();
    assert!(matches!(err, VMError::AssemblyError { line: 2, .. }));
    assert!(!default_output_path(&src).exists());
}

#[test]
fn unwritable_output_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("ok.asm");
    fs::write(&src, "BEGIN\nEND\n").unwrap();
    let image = dir.path().join("missing_dir").join("ok.emu");

    let err = build_file(&src, Some(image.as_path())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(!image.exists());
}

#[test]
fn corrupt_image_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("junk.emu");
    fs::write(&image, [0x00, 0x00, 0x7F, 0x00]).unwrap();

    let err = Program::load_file(&image).unwrap_err();
    assert!(matches!(
        err,
        VMError::InvalidOpcode {
            opcode: 0x7F,
            offset: 2
        }
    ));
}

#[test]
fn missing_image_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Program::load_file(dir.path().join("nope.emu")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}
