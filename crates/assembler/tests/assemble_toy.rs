//! TOY and S-TOY source assembled into 16-bit words.

use proptest as _;
use thiserror as _;

use assembler::{Assembler, AssemblerErrorKind, Position};
use rstest::rstest;
use simulator_core::isa::toy::ToyMode;
use simulator_core::Cell;

fn assemble(mode: ToyMode, source: &str) -> Vec<(i64, Cell)> {
    Assembler::toy(mode)
        .assemble(source)
        .unwrap()
        .encodings
        .into_iter()
        .collect()
}

#[test]
fn countdown_program_assembles_to_reference_words() {
    let source = "\
; sum 5 + 4 + ... + 1 into M[0x30]
      LDA R1 5
      LDA R2 1
      LDA R3 0
loop  BZ  R1 done
      ADD R3 R3 R1
      SUB R1 R1 R2
      BZ  R0 loop
done  ST  R3 0x30
      HLT
";
    let words: Vec<Cell> = assemble(ToyMode::Standard, source)
        .into_iter()
        .map(|(_, word)| word)
        .collect();
    assert_eq!(
        words,
        [0x7105, 0x7201, 0x7300, 0xC117, 0x1331, 0x2112, 0xC013, 0x9330, 0x0000]
    );
}

#[test]
fn auto_org_places_code_at_program_start() {
    let assembly = Assembler::toy(ToyMode::Standard)
        .assemble("start HLT\n")
        .unwrap();
    assert_eq!(assembly.base_address(), Some(0x10));
    assert_eq!(assembly.symbol("start"), Some(0x00));
}

#[test]
fn explicit_org_disables_auto_org() {
    let assembly = Assembler::toy(ToyMode::Standard)
        .assemble("ORG 0x00\nHLT\n")
        .unwrap();
    assert_eq!(assembly.base_address(), Some(0x00));
}

#[test]
fn data_directives_reserve_and_fill_words() {
    let assembly = Assembler::toy(ToyMode::Standard)
        .assemble("ORG 0x40\nbuf DUP 3\ntable DW 1, 0x2 0xFFFF\n")
        .unwrap();
    assert_eq!(assembly.symbol("buf"), Some(0x40));
    assert_eq!(assembly.symbol("table"), Some(0x43));
    assert_eq!(assembly.cells(), [0, 0, 0, 1, 2, 0xFFFF]);
}

#[test]
fn dw_value_must_fit_a_word() {
    let err = Assembler::toy(ToyMode::Standard)
        .assemble("DW 0x10000\n")
        .unwrap_err();
    assert_eq!(
        err.kind.to_string(),
        "Integer value 65536 is not in the valid range [0,65535]!"
    );
}

#[test]
fn branch_target_beyond_memory_is_rejected() {
    let err = Assembler::toy(ToyMode::Standard)
        .assemble("BZ R1 257\n")
        .unwrap_err();
    assert!(matches!(err.kind, AssemblerErrorKind::OutOfRange { value: 257, .. }));
    assert_eq!(err.location, Some(Position { line: 1, column: 7 }));
}

#[test]
fn program_running_off_the_end_of_memory_overflows() {
    let err = Assembler::toy(ToyMode::Standard)
        .assemble("ORG 0xFF\nHLT\nHLT\n")
        .unwrap_err();
    assert_eq!(
        err.kind,
        AssemblerErrorKind::AddressSpaceOverflow {
            address: 0x100,
            min: 0,
            max: 0xFF
        }
    );
    assert_eq!(err.location.map(|p| p.line), Some(3));
}

#[test]
fn data_block_overflow_names_its_first_address() {
    let err = Assembler::toy(ToyMode::Standard)
        .assemble("ORG 0xFF\nDW 1 2\n")
        .unwrap_err();
    assert_eq!(
        err.kind.to_string(),
        "Address space [0,255] overflow! Instruction can not be placed at address 255 (0xff)."
    );
}

#[test]
fn org_cannot_move_backwards() {
    let err = Assembler::toy(ToyMode::Standard)
        .assemble("ORG 0x20\nHLT\nORG 0x10\nHLT\n")
        .unwrap_err();
    assert!(matches!(err.kind, AssemblerErrorKind::OutOfRange { value: 0x10, .. }));
}

#[rstest]
#[case("ADD R1, R2, R3")]
#[case("ADD R1 R2 R3")]
#[case("add r1, r2 r3")]
fn commas_between_arguments_are_optional(#[case] line: &str) {
    assert_eq!(assemble(ToyMode::Standard, line), [(0x10, 0x1123)]);
}

#[rstest]
#[case("PUSH R1", 0x0101)]
#[case("POP RF", 0x020F)]
#[case("CALL sub", 0x0312)]
#[case("RET", 0x0400)]
#[case("STI R1 2 R3", 0xB123)]
#[case("STI R1 R3", 0xB103)]
fn stack_mode_encodings(#[case] line: &str, #[case] word: Cell) {
    let source = format!("{line}\nHLT\nsub RET\n");
    let encodings = assemble(ToyMode::Stack, &source);
    assert_eq!(encodings[0], (0x10, word));
}

#[test]
fn stack_mnemonics_are_unknown_in_standard_mode() {
    let err = Assembler::toy(ToyMode::Standard)
        .assemble("PUSH R1\n")
        .unwrap_err();
    assert!(matches!(err.kind, AssemblerErrorKind::Syntax { .. }), "{err}");
}

#[test]
fn labels_are_case_sensitive() {
    let err = Assembler::toy(ToyMode::Standard)
        .assemble("Loop BZ R0 loop\n")
        .unwrap_err();
    assert_eq!(
        err.kind,
        AssemblerErrorKind::UndefinedLabel {
            label: "loop".to_string()
        }
    );
}
