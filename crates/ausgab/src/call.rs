//! Event kinds reported by the transport engine

// crate modules
use crate::error::Error;

/// Kind of event an engine reports to scoring objects
///
/// Discriminants match the values used by EGSnrc, so engines passing raw
/// integers can convert with `TryFrom<i32>`.
///
/// ```rust
/// # use egstools_ausgab::AusgabCall;
/// assert_eq!(AusgabCall::try_from(28).unwrap(), AusgabCall::BeforeAnnihRest);
/// assert_eq!(AusgabCall::AfterAnnihRest.id(), 14);
/// assert!(AusgabCall::try_from(32).is_err());
/// ```
///
/// | ID | Event                 | ID | Event                 |
/// | -- | --------------------- | -- | --------------------- |
/// | 0  | before transport      | 16 | after pair            |
/// | 1  | below ECUT or PCUT    | 17 | before Compton        |
/// | 2  | below AE or AP        | 18 | after Compton         |
/// | 3  | user discard          | 19 | before photo          |
/// | 4  | extra energy          | 20 | after photo           |
/// | 5  | after transport       | 21 | entering uphi         |
/// | 6  | before brems          | 22 | leaving uphi          |
/// | 7  | after brems           | 23 | before Rayleigh       |
/// | 8  | before Moller         | 24 | after Rayleigh        |
/// | 9  | after Moller          | 25 | fluorescence          |
/// | 10 | before Bhabha         | 26 | Coster-Kronig         |
/// | 11 | after Bhabha          | 27 | Auger                 |
/// | 12 | before annih. flight  | 28 | before annih. at rest |
/// | 13 | after annih. flight   | 29 | before photonuclear   |
/// | 14 | after annih. at rest  | 30 | after photonuclear    |
/// | 15 | before pair           | 31 | unknown               |
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AusgabCall {
    BeforeTransport = 0,
    EgsCut = 1,
    PegsCut = 2,
    UserDiscard = 3,
    ExtraEnergy = 4,
    AfterTransport = 5,
    BeforeBrems = 6,
    AfterBrems = 7,
    BeforeMoller = 8,
    AfterMoller = 9,
    BeforeBhabha = 10,
    AfterBhabha = 11,
    BeforeAnnihFlight = 12,
    AfterAnnihFlight = 13,
    AfterAnnihRest = 14,
    BeforePair = 15,
    AfterPair = 16,
    BeforeCompton = 17,
    AfterCompton = 18,
    BeforePhoto = 19,
    AfterPhoto = 20,
    EnteringUphi = 21,
    LeavingUphi = 22,
    BeforeRayleigh = 23,
    AfterRayleigh = 24,
    FluorescentEvent = 25,
    CosterKronigEvent = 26,
    AugerEvent = 27,
    BeforeAnnihRest = 28,
    BeforePhotoNuc = 29,
    AfterPhotoNuc = 30,
    UnknownCall = 31,
}

impl AusgabCall {
    /// Numerical value of the event kind
    #[inline]
    pub fn id(&self) -> i32 {
        *self as i32
    }

    /// True for the events reported straight after an interaction
    ///
    /// The products of the interaction are on the stack at this point.
    pub fn is_after_interaction(&self) -> bool {
        matches!(
            self,
            Self::AfterBrems
                | Self::AfterMoller
                | Self::AfterBhabha
                | Self::AfterAnnihFlight
                | Self::AfterAnnihRest
                | Self::AfterPair
                | Self::AfterCompton
                | Self::AfterPhoto
                | Self::AfterRayleigh
                | Self::AfterPhotoNuc
        )
    }
}

impl TryFrom<i32> for AusgabCall {
    type Error = Error;

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::BeforeTransport),
            1 => Ok(Self::EgsCut),
            2 => Ok(Self::PegsCut),
            3 => Ok(Self::UserDiscard),
            4 => Ok(Self::ExtraEnergy),
            5 => Ok(Self::AfterTransport),
            6 => Ok(Self::BeforeBrems),
            7 => Ok(Self::AfterBrems),
            8 => Ok(Self::BeforeMoller),
            9 => Ok(Self::AfterMoller),
            10 => Ok(Self::BeforeBhabha),
            11 => Ok(Self::AfterBhabha),
            12 => Ok(Self::BeforeAnnihFlight),
            13 => Ok(Self::AfterAnnihFlight),
            14 => Ok(Self::AfterAnnihRest),
            15 => Ok(Self::BeforePair),
            16 => Ok(Self::AfterPair),
            17 => Ok(Self::BeforeCompton),
            18 => Ok(Self::AfterCompton),
            19 => Ok(Self::BeforePhoto),
            20 => Ok(Self::AfterPhoto),
            21 => Ok(Self::EnteringUphi),
            22 => Ok(Self::LeavingUphi),
            23 => Ok(Self::BeforeRayleigh),
            24 => Ok(Self::AfterRayleigh),
            25 => Ok(Self::FluorescentEvent),
            26 => Ok(Self::CosterKronigEvent),
            27 => Ok(Self::AugerEvent),
            28 => Ok(Self::BeforeAnnihRest),
            29 => Ok(Self::BeforePhotoNuc),
            30 => Ok(Self::AfterPhotoNuc),
            31 => Ok(Self::UnknownCall),
            _ => Err(Error::UnknownCall(v)),
        }
    }
}

impl std::fmt::Display for AusgabCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} ({})", self, self.id())
    }
}
