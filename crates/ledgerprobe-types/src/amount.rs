//! Amount rendering in the ledger's display unit.

/// Number of decimal places in one display unit.
pub const DISPLAY_DECIMALS: usize = 12;

/// Atomic units per display unit.
pub const COIN: u64 = 1_000_000_000_000;

/// Format an atomic amount in display units with all 12 decimals,
/// e.g. `17592186044415` becomes `17.592186044415`.
///
/// Integer arithmetic only, so large sums render exactly.
pub fn format_amount(atomic: u128) -> String {
    let coin = u128::from(COIN);
    format!(
        "{}.{:0width$}",
        atomic / coin,
        atomic % coin,
        width = DISPLAY_DECIMALS
    )
}
