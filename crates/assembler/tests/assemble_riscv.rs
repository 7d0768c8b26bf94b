//! RISC-V source assembled into little-endian byte cells.

use thiserror as _;

use assembler::{Assembler, AssemblerConfig, AssemblerErrorKind, Context, Position};
use proptest::prelude::*;
use rstest::rstest;
use simulator_core::isa::riscv;
use simulator_core::{combine_cells, ByteOrder, Cell};

fn cells(source: &str) -> Vec<Cell> {
    Assembler::riscv().assemble(source).unwrap().cells()
}

fn word_at(cells: &[Cell], address: usize) -> u32 {
    let value = combine_cells(&cells[address..address + 4], 8, ByteOrder::Little);
    u32::try_from(value).unwrap()
}

#[test]
fn word_directive_emits_one_little_endian_word_per_value() {
    let assembly = Assembler::riscv()
        .assemble(".org 0x100\n.word 5, 6, 7\nafter: EBREAK\n")
        .unwrap();
    assert_eq!(assembly.base_address(), Some(0x100));
    assert_eq!(assembly.symbol("after"), Some(0x10C));
    assert_eq!(
        &assembly.cells()[..12],
        [5, 0, 0, 0, 6, 0, 0, 0, 7, 0, 0, 0]
    );
}

#[test]
fn word_directive_wraps_negatives_and_accepts_labels() {
    let cells = cells("start: .word -1, start, 0xFFFFFFFF\n");
    assert_eq!(word_at(&cells, 0), 0xFFFF_FFFF);
    assert_eq!(word_at(&cells, 4), 0);
    assert_eq!(word_at(&cells, 8), 0xFFFF_FFFF);
}

#[test]
fn forward_branch_matches_numeric_offset() {
    let labelled = cells("BEQ x1, x2, done\nADDI x1, x1, 1\ndone: EBREAK\n");
    let numeric = cells("BEQ x1, x2, 8\n");
    assert_eq!(labelled[..4], numeric[..4]);
    assert_eq!(word_at(&labelled, 8), riscv::EBREAK);
}

#[test]
fn backward_jump_is_negative() {
    let labelled = cells("loop: ADDI x1, x1, 1\nJAL x0, loop\n");
    let numeric = cells("ADDI x1, x1, 1\nJAL x0, -4\n");
    assert_eq!(labelled, numeric);

    let table = riscv::instructions();
    let jal = table.decode(4, word_at(&labelled, 4)).unwrap();
    assert_eq!(jal.mnemonic(), "JAL");
    assert_eq!(jal.imm(), -4);
}

#[test]
fn load_and_store_labels_address_from_x0() {
    let source = "LW x1, value\nSW x1, value\nEBREAK\n.org 0x100\nvalue: .word 42\n";
    let labelled = cells(source);
    let numeric = cells("LW x1, 256(x0)\nSW x1, 256(x0)\n");
    assert_eq!(labelled[..8], numeric[..8]);
}

#[test]
fn abi_names_and_case_are_accepted() {
    assert_eq!(cells("addi SP, sp, -16\n"), cells("ADDI x2, x2, -16\n"));
}

#[rstest]
#[case("ADD x1, x2\n", Position { line: 1, column: 11 }, "Comma")]
#[case("LW x1, 4(x2\n", Position { line: 1, column: 12 }, "Closing Bracket")]
fn syntax_errors_point_at_the_furthest_token(
    #[case] source: &str,
    #[case] position: Position,
    #[case] expected: &str,
) {
    let err = Assembler::riscv().assemble(source).unwrap_err();
    assert!(matches!(err.kind, AssemblerErrorKind::Syntax { .. }), "{err}");
    assert_eq!(err.location, Some(position));
    assert!(err.to_string().contains(expected), "{err}");
}

#[test]
fn undefined_label_is_reported_with_its_line() {
    let err = Assembler::riscv()
        .assemble("ADDI x1, x0, 1\nJAL ra, nowhere\n")
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "2:9: error: Label 'nowhere' is not defined!"
    );
}

#[test]
fn duplicate_label_names_the_first_definition() {
    let err = Assembler::riscv()
        .assemble("here: EBREAK\nhere: EBREAK\n")
        .unwrap_err();
    assert_eq!(
        err.kind.to_string(),
        "Redefinition of label 'here'! First defined at 1:1."
    );
    assert_eq!(err.location, Some(Position { line: 2, column: 1 }));
}

#[test]
fn lexical_error_aborts_assembly() {
    let err = Assembler::riscv().assemble("ADDI x1, x0, 1 $\n").unwrap_err();
    assert_eq!(
        err.kind,
        AssemblerErrorKind::UnexpectedCharacter { character: '$' }
    );
}

#[test]
fn misaligned_branch_label_is_rejected() {
    let err = Assembler::riscv()
        .assemble("BEQ x0, x0, odd\n.org 0x11\nodd: .word 0\n")
        .unwrap_err();
    assert!(
        matches!(err.kind, AssemblerErrorKind::OffsetMisaligned { offset: 17, .. }),
        "{err}"
    );
}

#[test]
fn emission_past_the_address_space_overflows() {
    let err = Assembler::riscv()
        .assemble(".org 0xFFFFFFFE\nEBREAK\n")
        .unwrap_err();
    assert!(
        matches!(
            err.kind,
            AssemblerErrorKind::AddressSpaceOverflow {
                address: 0xFFFF_FFFE,
                ..
            }
        ),
        "{err}"
    );
}

proptest! {
    #[test]
    fn resolving_twice_gives_the_same_operands(
        rd in 0_u8..32,
        rs1 in 0_u8..32,
        imm in -2048_i64..=4095,
        gap in 0_usize..8,
    ) {
        let padding = "ADDI x0, x0, 0\n".repeat(gap);
        let source = format!("ADDI x{rd}, x{rs1}, {imm}\nBEQ x0, x0, end\n{padding}end: EBREAK\n");
        let assembly = Assembler::riscv().assemble(&source).unwrap();

        let mut ctx = Context::new(&AssemblerConfig::riscv());
        ctx.symbols = assembly.symbols.clone();
        for inst in &assembly.instructions {
            let again = inst.description.resolve(inst, &ctx).unwrap();
            prop_assert_eq!(Some(again), inst.operands.clone());
        }
    }

    #[test]
    fn assembled_immediates_decode_back(rd in 1_u8..32, rs1 in 0_u8..32, imm in -2048_i64..=2047) {
        let cells = cells(&format!("ADDI x{rd}, x{rs1}, {imm}\n"));
        let inst = riscv::instructions().decode(0, word_at(&cells, 0)).unwrap();
        prop_assert_eq!(inst.mnemonic(), "ADDI");
        prop_assert_eq!(inst.rd(), rd);
        prop_assert_eq!(inst.rs1(), rs1);
        prop_assert_eq!(inst.imm(), imm);
    }
}
