use std::convert::TryFrom;

use crate::error::Error;

#[repr(u8)]
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum QoS {
    #[default]
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl TryFrom<u8> for QoS {
    type Error = Error;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            0x00 => Ok(QoS::AtMostOnce),
            0x01 => Ok(QoS::AtLeastOnce),
            0x02 => Ok(QoS::ExactlyOnce),
            _ => Err(Error::ProtocolViolation("QoS level 3 is reserved")),
        }
    }
}

impl From<QoS> for u8 {
    fn from(qos: QoS) -> u8 {
        qos as u8
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryInto;

    use crate::{error::Error, qos::QoS};

    #[test]
    fn test_qos_from_u8() {
        let mut result: QoS = 0x00u8.try_into().unwrap();
        assert_eq!(QoS::AtMostOnce, result);

        result = 0x01u8.try_into().unwrap();
        assert_eq!(QoS::AtLeastOnce, result);

        result = 0x02u8.try_into().unwrap();
        assert_eq!(QoS::ExactlyOnce, result);

        let invalid: Result<QoS, Error> = 0x03u8.try_into();
        assert!(matches!(invalid, Err(Error::ProtocolViolation(_))));
    }

    #[test]
    fn test_qos_into_u8() {
        assert_eq!(u8::from(QoS::ExactlyOnce), 2);
        assert_eq!(u8::from(QoS::default()), 0);
    }
}
