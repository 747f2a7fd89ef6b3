use super::ProtocolError;

/// Current backend transaction status, reported in `ReadyForQuery`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransactionStatus {
    /// `I` if idle (not in a transaction block).
    #[default]
    Idle,
    /// `T` if in a transaction block.
    InTransaction,
    /// `E` if in a failed transaction block (queries will be rejected until block is ended).
    Failed,
}

impl TransactionStatus {
    /// Parse status indicator byte.
    pub fn from_byte(byte: u8) -> Result<TransactionStatus, ProtocolError> {
        match byte {
            b'I' => Ok(Self::Idle),
            b'T' => Ok(Self::InTransaction),
            b'E' => Ok(Self::Failed),
            _ => Err(ProtocolError::InvalidTransactionStatus(byte)),
        }
    }

    /// Status indicator byte.
    pub const fn as_byte(&self) -> u8 {
        match self {
            Self::Idle => b'I',
            Self::InTransaction => b'T',
            Self::Failed => b'E',
        }
    }
}

/// Object addressed by `Describe` or `Close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetType {
    /// `S`, a prepared statement.
    Statement,
    /// `P`, a portal.
    Portal,
}

impl TargetType {
    pub fn from_byte(byte: u8) -> Result<TargetType, ProtocolError> {
        match byte {
            b'S' => Ok(Self::Statement),
            b'P' => Ok(Self::Portal),
            _ => Err(ProtocolError::InvalidTargetType(byte)),
        }
    }

    pub const fn as_byte(&self) -> u8 {
        match self {
            Self::Statement => b'S',
            Self::Portal => b'P',
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_bytes() {
        for status in [TransactionStatus::Idle, TransactionStatus::InTransaction, TransactionStatus::Failed] {
            assert_eq!(TransactionStatus::from_byte(status.as_byte()).unwrap(), status);
        }
        assert!(matches!(
            TransactionStatus::from_byte(b'X'),
            Err(ProtocolError::InvalidTransactionStatus(b'X'))
        ));
        assert!(matches!(TargetType::from_byte(b's'), Err(ProtocolError::InvalidTargetType(b's'))));
        assert_eq!(TargetType::from_byte(b'P').unwrap(), TargetType::Portal);
    }
}
