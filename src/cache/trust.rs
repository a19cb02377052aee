use crate::message::SectionType;

//ordered from least to most trustworthy
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrustLevel {
    AdditionalWithoutAA,
    AuthorityWithoutAA,
    AdditionalWithAA,
    AnswerWithoutAA,
    AuthorityWithAA,
    AnswerWithAA,
}

impl TrustLevel {
    pub fn from_section(section: SectionType, authoritative: bool) -> Self {
        match (section, authoritative) {
            (SectionType::Answer, true) => TrustLevel::AnswerWithAA,
            (SectionType::Answer, false) => TrustLevel::AnswerWithoutAA,
            (SectionType::Authority, true) => TrustLevel::AuthorityWithAA,
            (SectionType::Authority, false) => TrustLevel::AuthorityWithoutAA,
            (SectionType::Additional, true) => TrustLevel::AdditionalWithAA,
            (SectionType::Additional, false) => TrustLevel::AdditionalWithoutAA,
        }
    }

    //glue and referral data shouldn't be handed out as an answer
    #[inline]
    pub fn is_answer(self) -> bool {
        self >= TrustLevel::AnswerWithoutAA
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SecurityStatus {
    Bogus,
    Unchecked,
    Insecure,
    Secure,
}

impl Default for SecurityStatus {
    fn default() -> Self {
        SecurityStatus::Unchecked
    }
}
