#[cfg(test)]
mod tests {
    use crate::virtual_machine::isa::Opcode;
    use std::collections::HashSet;

    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    // Images written by older builds stop loading if this changes.
    const EXPECTED_ISA_HASH: u64 = 12157016703428527561;

    fn fnv1a64(mut h: u64, bytes: &[u8]) -> u64 {
        for b in bytes {
            h ^= *b as u64;
            h = h.wrapping_mul(FNV_PRIME);
        }
        h
    }

    macro_rules! hash_isa {
        (
            $( $(#[$doc:meta])* $name:ident = $opcode:literal, $mnemonic:literal => $kind:ident ),* $(,)?
        ) => {{
            let mut h = FNV_OFFSET;
            $(
                h = fnv1a64(h, stringify!($name).as_bytes());
                h = fnv1a64(h, &[Opcode::$name as u8]);
                h = fnv1a64(h, $mnemonic.as_bytes());
                h = fnv1a64(h, stringify!($kind).as_bytes());
            )*
            h
        }};
    }

    fn current_isa_hash() -> u64 {
        crate::for_each_instruction!(hash_isa)
    }

    #[test]
    #[ignore]
    fn print_isa_hash() {
        println!("ISA_HASH={}", current_isa_hash());
    }

    #[test]
    fn isa_hash_unchanged() {
        assert_eq!(current_isa_hash(), EXPECTED_ISA_HASH);
    }

    #[test]
    fn opcodes_and_mnemonics_unique() {
        let bytes: HashSet<u8> = Opcode::ALL.iter().map(|op| *op as u8).collect();
        let names: HashSet<&str> = Opcode::ALL.iter().map(|op| op.mnemonic()).collect();
        assert_eq!(bytes.len(), Opcode::ALL.len());
        assert_eq!(names.len(), Opcode::ALL.len());
    }

    #[test]
    fn mnemonics_are_upper_case() {
        for op in Opcode::ALL {
            let name = op.mnemonic();
            assert_eq!(name, name.to_ascii_uppercase());
            assert_eq!(Opcode::from_mnemonic(name), Some(*op));
        }
    }
}
