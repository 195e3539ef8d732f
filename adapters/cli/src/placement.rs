use std::{error::Error, fmt, str::FromStr};

use tank_defence_core::{CellCoord, WeaponKind};

/// Separates the weapon name from its cell.
const KIND_DELIMITER: char = '@';
/// Separates the column from the row.
const CELL_DELIMITER: char = ',';

/// Weapon requested on the command line, written as `kind@column,row`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct WeaponPlacement {
    /// Type of weapon to build.
    pub(crate) kind: WeaponKind,
    /// Cell the weapon occupies.
    pub(crate) cell: CellCoord,
}

impl FromStr for WeaponPlacement {
    type Err = PlacementParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(PlacementParseError::Empty);
        }

        let (kind, cell) = trimmed
            .split_once(KIND_DELIMITER)
            .ok_or(PlacementParseError::MissingCell)?;
        Ok(Self {
            kind: parse_kind(kind)?,
            cell: parse_cell(cell)?,
        })
    }
}

/// Errors that can occur while parsing a weapon placement argument.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PlacementParseError {
    /// The argument was empty or contained only whitespace.
    Empty,
    /// The argument did not name a cell after the weapon.
    MissingCell,
    /// The weapon name is not known.
    UnknownKind(String),
    /// The cell could not be parsed as `column,row`.
    InvalidCell(String),
}

impl fmt::Display for PlacementParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "weapon placement was empty"),
            Self::MissingCell => write!(f, "weapon placement must look like kind@column,row"),
            Self::UnknownKind(kind) => write!(
                f,
                "weapon '{kind}' is not supported, expected machine-gun or cannon"
            ),
            Self::InvalidCell(cell) => write!(f, "could not parse cell '{cell}'"),
        }
    }
}

impl Error for PlacementParseError {}

fn parse_kind(kind: &str) -> Result<WeaponKind, PlacementParseError> {
    match kind.trim().to_ascii_lowercase().as_str() {
        "machine-gun" | "machinegun" | "mg" => Ok(WeaponKind::MachineGun),
        "cannon" => Ok(WeaponKind::Cannon),
        other => Err(PlacementParseError::UnknownKind(other.to_owned())),
    }
}

fn parse_cell(cell: &str) -> Result<CellCoord, PlacementParseError> {
    let invalid = || PlacementParseError::InvalidCell(cell.to_owned());
    let (column, row) = cell.split_once(CELL_DELIMITER).ok_or_else(invalid)?;
    let column = column.trim().parse::<i32>().map_err(|_| invalid())?;
    let row = row.trim().parse::<i32>().map_err(|_| invalid())?;
    Ok(CellCoord::new(column, row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kind_and_cell() {
        assert_eq!(
            "cannon@4,2".parse::<WeaponPlacement>(),
            Ok(WeaponPlacement {
                kind: WeaponKind::Cannon,
                cell: CellCoord::new(4, 2),
            })
        );
        assert_eq!(
            " Machine-Gun @ 7, 3 ".parse::<WeaponPlacement>(),
            Ok(WeaponPlacement {
                kind: WeaponKind::MachineGun,
                cell: CellCoord::new(7, 3),
            })
        );
    }

    #[test]
    fn reports_malformed_arguments() {
        assert_eq!("".parse::<WeaponPlacement>(), Err(PlacementParseError::Empty));
        assert_eq!(
            "cannon".parse::<WeaponPlacement>(),
            Err(PlacementParseError::MissingCell)
        );
        assert_eq!(
            "laser@1,1".parse::<WeaponPlacement>(),
            Err(PlacementParseError::UnknownKind("laser".to_owned()))
        );
        assert_eq!(
            "mg@1;1".parse::<WeaponPlacement>(),
            Err(PlacementParseError::InvalidCell("1;1".to_owned()))
        );
    }
}
