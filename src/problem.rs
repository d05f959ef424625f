//! Plain text problem files describing one allocation round
//!
//! ```text
//! # Comments run to the end of the line
//! phys 0 alias 1 2
//! phys 3
//! virt 10 weight 2.5 cand 0 3
//! virt 11 weight inf fixed cand 3
//! interfere 10 11
//! ```
//!
//! Resources must be declared before the demands that name them as candidates, and
//! demands before the interferences that mention them

use crate::registers::{PhysReg, Registers, VirtReg};
use anyhow::{bail, ensure, Context, Result};
use std::{iter::Peekable, str::SplitWhitespace};

/// Parses a problem file into a fresh set of [`Registers`]
pub fn parse(source: &str) -> Result<Registers> {
    let mut registers = Registers::new();

    for (idx, line) in source.lines().enumerate() {
        let line_number = idx + 1;
        let line = line.split('#').next().unwrap_or_default();

        parse_line(&mut registers, line).with_context(|| format!("error on line {}", line_number))?;
    }

    tracing::debug!(
        "parsed {} resource groups and {} demands",
        registers.group_count(),
        registers.virt_count(),
    );

    Ok(registers)
}

fn parse_line(registers: &mut Registers, line: &str) -> Result<()> {
    let mut tokens = line.split_whitespace().peekable();

    let directive = match tokens.next() {
        Some(directive) => directive,
        None => return Ok(()),
    };

    match directive {
        "phys" => {
            let phys = PhysReg(raw_id(&mut tokens, "physical register")?);

            let mut aliases = Vec::new();
            if tokens.next_if_eq(&"alias").is_some() {
                while tokens.peek().is_some() {
                    aliases.push(PhysReg(raw_id(&mut tokens, "alias")?));
                }
                ensure!(!aliases.is_empty(), "`alias` must be followed by at least one id");
            }
            expect_end(&mut tokens)?;

            if registers.phys_group(phys).is_some() {
                tracing::warn!("{} was declared twice, ignoring its aliases", phys);
            }
            registers.add_phys(phys, &aliases);
        }

        "virt" => {
            let virt = VirtReg(raw_id(&mut tokens, "virtual register")?);

            expect_keyword(&mut tokens, "weight")?;
            let weight = weight(&mut tokens)?;

            let spillable = tokens.next_if_eq(&"fixed").is_none();

            expect_keyword(&mut tokens, "cand")?;
            let mut candidates = Vec::new();
            while tokens.peek().is_some() {
                candidates.push(PhysReg(raw_id(&mut tokens, "candidate")?));
            }
            ensure!(!candidates.is_empty(), "{} has no candidates", virt);
            for &candidate in &candidates {
                ensure!(
                    registers.phys_group(candidate).is_some(),
                    "candidate {} of {} must be declared before the demands naming it",
                    candidate,
                    virt,
                );
            }

            ensure!(
                registers.add_virt(virt, candidates, weight, spillable),
                "{} was declared twice",
                virt,
            );
        }

        "interfere" => {
            let lhs = VirtReg(raw_id(&mut tokens, "virtual register")?);
            let rhs = VirtReg(raw_id(&mut tokens, "virtual register")?);
            expect_end(&mut tokens)?;

            ensure!(lhs != rhs, "{} can't interfere with itself", lhs);
            for virt in [lhs, rhs] {
                ensure!(
                    registers.virt(virt).is_some(),
                    "{} must be declared before its interferences",
                    virt,
                );
            }

            registers.add_virt_interference(lhs, rhs);
        }

        unknown => bail!(
            "unknown directive `{}`, expected `phys`, `virt` or `interfere`",
            unknown,
        ),
    }

    Ok(())
}

fn raw_id(tokens: &mut Peekable<SplitWhitespace>, what: &str) -> Result<u32> {
    let token = tokens
        .next()
        .with_context(|| format!("expected a {} id", what))?;

    token
        .parse()
        .with_context(|| format!("invalid {} id `{}`", what, token))
}

fn weight(tokens: &mut Peekable<SplitWhitespace>) -> Result<f64> {
    let token = tokens.next().context("expected a spill weight")?;

    // `f64`'s parser already understands `inf`
    let weight: f64 = token
        .parse()
        .with_context(|| format!("invalid spill weight `{}`", token))?;
    ensure!(
        !weight.is_nan() && weight >= 0.0,
        "spill weights must be non-negative, got `{}`",
        token,
    );

    Ok(weight)
}

fn expect_keyword(tokens: &mut Peekable<SplitWhitespace>, keyword: &str) -> Result<()> {
    match tokens.next() {
        Some(token) if token == keyword => Ok(()),
        Some(token) => bail!("expected `{}`, got `{}`", keyword, token),
        None => bail!("expected `{}`", keyword),
    }
}

fn expect_end(tokens: &mut Peekable<SplitWhitespace>) -> Result<()> {
    match tokens.next() {
        Some(token) => bail!("unexpected trailing `{}`", token),
        None => Ok(()),
    }
}
