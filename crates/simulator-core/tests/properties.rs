//! Property checks over encodings, decode dispatch and bit fields.

use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use serde_json as _;
use thiserror as _;

use proptest::prelude::*;
use rstest::rstest;
use simulator_core::isa::{riscv, toy};
use simulator_core::{
    combine_cells, sign_extend, split_cells, BitField, ByteOrder, IsaTable,
};

fn tables() -> [IsaTable; 3] {
    [
        riscv::instructions(),
        toy::instructions("-t"),
        toy::instructions("-s"),
    ]
}

#[rstest]
#[case(riscv::instructions())]
#[case(toy::instructions("-t"))]
#[case(toy::instructions("-s"))]
fn builtin_tables_have_no_order_dependent_formats(#[case] table: IsaTable) {
    assert!(table.dispatch_conflicts().is_empty());
}

proptest! {
    #[test]
    fn at_most_one_description_claims_a_word(word in any::<u32>()) {
        for table in tables() {
            let word = if table.word_bits() == 16 { word & 0xFFFF } else { word };
            let claimants = table
                .descriptions()
                .iter()
                .filter(|desc| desc.matches(word))
                .count();
            prop_assert!(claimants <= 1, "{} claimants in {}", claimants, table.name());
        }
    }

    #[test]
    fn decoded_fields_reencode_to_an_equivalent_word(word in any::<u32>()) {
        for table in tables() {
            let word = if table.word_bits() == 16 { word & 0xFFFF } else { word };
            let Ok(inst) = table.decode(0, word) else {
                continue;
            };
            let again = inst.desc.encode(&inst.fields).unwrap();
            let redecoded = table.decode(0, again).unwrap();
            prop_assert_eq!(redecoded.mnemonic(), inst.mnemonic());
            prop_assert_eq!(redecoded.fields, inst.fields);
        }
    }

    #[test]
    fn splitting_a_field_and_concatenating_restores_it(
        bits in any::<u64>(),
        width in 2u32..=64,
        cut in 1u32..64,
    ) {
        let cut = cut % (width - 1) + 1;
        let bits = if width == 64 { bits } else { bits & ((1u64 << width) - 1) };
        let field = BitField::from_bits(bits, width).unwrap();
        let high = i32::try_from(width - 1).unwrap();
        let cut = i32::try_from(cut).unwrap();
        let joined = BitField::concat(&[
            field.slice(high, cut).unwrap(),
            field.slice(cut - 1, 0).unwrap(),
        ])
        .unwrap();
        prop_assert_eq!(joined, field);
    }

    #[test]
    fn sign_extension_stays_in_range(value in any::<i64>(), width in 1u32..=63) {
        let extended = sign_extend(value, width);
        let bound = 1i64 << (width - 1);
        prop_assert!((-bound..bound).contains(&extended));
        prop_assert_eq!(sign_extend(extended, width), extended);
    }

    #[test]
    fn cell_split_and_combine_agree(value in any::<u32>(), big in any::<bool>()) {
        let order = if big { ByteOrder::Big } else { ByteOrder::Little };
        let cells = split_cells(u64::from(value), 4, 8, order);
        prop_assert_eq!(combine_cells(&cells, 8, order), u64::from(value));
    }
}
