use std::fmt::{self, Debug, Display, Write};

/// A raw physical resource id as handed to us by the driver
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PhysReg(pub u32);

impl Debug for PhysReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PhysReg(")?;
        Debug::fmt(&self.0, f)?;
        f.write_char(')')
    }
}

impl Display for PhysReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('p')?;
        Display::fmt(&self.0, f)
    }
}

/// A raw demand (virtual register) id as handed to us by the driver
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct VirtReg(pub u32);

impl Debug for VirtReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VirtReg(")?;
        Debug::fmt(&self.0, f)?;
        f.write_char(')')
    }
}

impl Display for VirtReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('v')?;
        Display::fmt(&self.0, f)
    }
}
