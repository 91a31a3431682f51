pub const TLB_SIZE: usize = 8;
pub const NUM_PROCESSES: usize = 4;
pub const NUM_REGISTERS: usize = 2;

// field widths of the packed entry words
pub const VPN_FIELD_BITS: u32 = 8;
pub const PFN_FIELD_BITS: u32 = 8;
pub const PID_FIELD_BITS: u32 = 2;
pub const VALID_FIELD_BITS: u32 = 1;
pub const AGE_FIELD_BITS: u32 = 8;
pub const PRESENT_FIELD_BITS: u32 = 8;

pub const VPN_FIELD_MASK: u32 = (1 << VPN_FIELD_BITS) - 1;
pub const PFN_FIELD_MASK: u32 = (1 << PFN_FIELD_BITS) - 1;
pub const PID_FIELD_MASK: u32 = (1 << PID_FIELD_BITS) - 1;
pub const VALID_FIELD_MASK: u32 = (1 << VALID_FIELD_BITS) - 1;
pub const AGE_FIELD_MASK: u32 = (1 << AGE_FIELD_BITS) - 1;
pub const PRESENT_FIELD_MASK: u32 = (1 << PRESENT_FIELD_BITS) - 1;

// TLB word: vpn | pfn | pid | valid | age
pub const TLB_AGE_SHIFT: u32 = 0;
pub const TLB_VALID_SHIFT: u32 = TLB_AGE_SHIFT + AGE_FIELD_BITS;
pub const TLB_PID_SHIFT: u32 = TLB_VALID_SHIFT + VALID_FIELD_BITS;
pub const TLB_PFN_SHIFT: u32 = TLB_PID_SHIFT + PID_FIELD_BITS;
pub const TLB_VPN_SHIFT: u32 = TLB_PFN_SHIFT + PFN_FIELD_BITS;

// page table word: pfn | present | valid
pub const PTE_VALID_SHIFT: u32 = 0;
pub const PTE_PRESENT_SHIFT: u32 = PTE_VALID_SHIFT + VALID_FIELD_BITS;
pub const PTE_PFN_SHIFT: u32 = PTE_PRESENT_SHIFT + PRESENT_FIELD_BITS;

/// Upper bound on `offset + pfn` (and `offset + vpn`) bits accepted by `define`.
pub const MAX_ADDRESS_BITS: u32 = 24;
