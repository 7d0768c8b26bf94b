#![no_main]

use libfuzzer_sys::fuzz_target;
use simulator_core::isa::{riscv, toy::ToyMode};
use simulator_core::{disassemble, DisplayOptions, MachineConfig, SimpleRam, Simulator};

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let word = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let riscv = riscv::instructions();
    if let Ok(inst) = riscv.decode(0, word) {
        let _ = inst.format(DisplayOptions { abi_names: true });
    }

    let cells: Vec<u16> = data.iter().map(|byte| u16::from(*byte)).collect();
    let _ = disassemble(&riscv, 0, &cells, DisplayOptions::default());
    let mut ram = SimpleRam::zeroed(0, cells.len().max(4), 8);
    let _ = simulator_core::MemorySubsystem::write(&mut ram, 0, &cells);
    let config = MachineConfig {
        instruction_limit: Some(256),
        initial_register_value: Some(0),
        ..MachineConfig::riscv()
    };
    let _ = Simulator::new(riscv, config, ram).run();

    for mode in ToyMode::ALL {
        let words: Vec<u16> = data
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        let mut ram = SimpleRam::zeroed(0, 256, 16);
        let _ = simulator_core::MemorySubsystem::write(&mut ram, 0x10, &words);
        let config = MachineConfig {
            instruction_limit: Some(256),
            initial_register_value: Some(0),
            ..MachineConfig::toy()
        };
        let _ = Simulator::new(mode.instructions(), config, ram).run();
    }
});
