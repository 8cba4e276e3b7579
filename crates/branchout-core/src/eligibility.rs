//! Prompt eligibility rules.
//!
//! Each [`PromptKind`] answers three questions about a pair of students:
//! whether the requesting student has the data the prompt needs at all
//! ([`PromptKind::check_prerequisites`]), whether another student belongs in
//! the candidate list ([`PromptKind::is_candidate`]), and whether a chosen
//! answer is acceptable ([`PromptKind::validate`]). Validation mirrors the
//! candidate rules but reports which rule failed.

use crate::{
  Error, Result,
  prompt::PromptKind,
  student::StudentProfile,
  tag::TagKind,
};

fn shares(a: &StudentProfile, b: &StudentProfile, kind: TagKind) -> bool {
  let theirs = b.tags(kind);
  a.tags(kind).iter().any(|name| theirs.contains(name))
}

fn violation(message: impl Into<String>) -> Error {
  Error::RuleViolation(message.into())
}

impl PromptKind {
  /// Fail with [`Error::MissingPrerequisite`] when `user` lacks the tags this
  /// prompt intersects on.
  pub fn check_prerequisites(self, user: &StudentProfile) -> Result<()> {
    match self {
      Self::SameLanguageAndHobby
        if user.languages.is_empty() || user.interests.is_empty() =>
      {
        Err(Error::MissingPrerequisite(
          "you need at least one language and one interest for this prompt"
            .to_owned(),
        ))
      }
      Self::DifferentYearSameClub if user.clubs.is_empty() => {
        Err(Error::MissingPrerequisite(
          "you need at least one club for this prompt".to_owned(),
        ))
      }
      _ => Ok(()),
    }
  }

  /// Whether `other` is a plausible answer for `user`. The user themself is
  /// never a candidate.
  pub fn is_candidate(self, user: &StudentProfile, other: &StudentProfile) -> bool {
    if user.id == other.id {
      return false;
    }
    match self {
      Self::SameFaculty => user.faculty == other.faculty,
      Self::SameLanguageAndHobby => {
        shares(user, other, TagKind::Language)
          && shares(user, other, TagKind::Interest)
      }
      Self::DifferentYearSameClub => {
        user.year != other.year && shares(user, other, TagKind::Club)
      }
      Self::Custom => true,
    }
  }

  /// Filter `students` down to the candidates for `user`.
  pub fn candidates(
    self,
    user: &StudentProfile,
    students: impl IntoIterator<Item = StudentProfile>,
  ) -> Result<Vec<StudentProfile>> {
    self.check_prerequisites(user)?;
    Ok(
      students
        .into_iter()
        .filter(|other| self.is_candidate(user, other))
        .collect(),
    )
  }

  /// Check a submitted answer, naming the rule that failed.
  ///
  /// For [`PromptKind::DifferentYearSameClub`] the shared-club requirement
  /// only applies when the submitter belongs to at least one club; a
  /// submitter with no clubs only needs a different year.
  pub fn validate(
    self,
    submitter: &StudentProfile,
    candidate: &StudentProfile,
  ) -> Result<()> {
    if submitter.id == candidate.id {
      return Err(violation("you cannot match yourself to a prompt"));
    }

    match self {
      Self::SameFaculty => {
        if submitter.faculty != candidate.faculty {
          return Err(violation(format!(
            "this prompt requires someone from your faculty ({})",
            submitter.faculty
          )));
        }
      }
      Self::SameLanguageAndHobby => {
        if !shares(submitter, candidate, TagKind::Language) {
          return Err(violation(
            "this prompt requires someone who speaks at least one of your languages",
          ));
        }
        if !shares(submitter, candidate, TagKind::Interest) {
          return Err(violation(
            "this prompt requires someone who shares at least one of your interests",
          ));
        }
      }
      Self::DifferentYearSameClub => {
        if submitter.year == candidate.year {
          return Err(violation(
            "this prompt requires someone from a different year than you",
          ));
        }
        if !submitter.clubs.is_empty()
          && !shares(submitter, candidate, TagKind::Club)
        {
          return Err(violation(
            "this prompt requires someone who is in at least one of your clubs",
          ));
        }
      }
      Self::Custom => {}
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn student(id: i64, year: i64, faculty: &str) -> StudentProfile {
    StudentProfile {
      id,
      name: format!("student {id}"),
      year,
      faculty: faculty.into(),
      profile_picture: crate::student::DEFAULT_PROFILE_PICTURE.into(),
      interests: vec![],
      clubs: vec![],
      languages: vec![],
    }
  }

  fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
  }

  // ─── Validation ────────────────────────────────────────────────────────────

  #[test]
  fn same_faculty_accepts_equal_faculty() {
    let a = student(1, 1, "CS");
    let b = student(2, 3, "CS");
    assert!(PromptKind::SameFaculty.validate(&a, &b).is_ok());
  }

  #[test]
  fn same_faculty_rejects_other_faculty_naming_it() {
    let a = student(1, 1, "CS");
    let b = student(2, 1, "Math");
    let err = PromptKind::SameFaculty.validate(&a, &b).unwrap_err();
    assert!(matches!(&err, Error::RuleViolation(m) if m.contains("(CS)")), "{err}");
  }

  #[test]
  fn language_failure_reported_before_hobby() {
    let mut a = student(1, 1, "CS");
    a.languages = names(&["English", "Spanish"]);
    a.interests = names(&["Music"]);
    let mut b = student(2, 1, "CS");
    b.languages = names(&["French"]);
    b.interests = names(&["Music"]);

    let err = PromptKind::SameLanguageAndHobby.validate(&a, &b).unwrap_err();
    assert!(matches!(&err, Error::RuleViolation(m) if m.contains("languages")), "{err}");
  }

  #[test]
  fn hobby_failure_reported_when_language_shared() {
    let mut a = student(1, 1, "CS");
    a.languages = names(&["English"]);
    a.interests = names(&["Music"]);
    let mut b = student(2, 1, "CS");
    b.languages = names(&["English"]);
    b.interests = names(&["Chess"]);

    let err = PromptKind::SameLanguageAndHobby.validate(&a, &b).unwrap_err();
    assert!(matches!(&err, Error::RuleViolation(m) if m.contains("interests")), "{err}");
  }

  #[test]
  fn different_year_rejects_same_year() {
    let a = student(1, 2, "CS");
    let b = student(2, 2, "CS");
    assert!(matches!(
      PromptKind::DifferentYearSameClub.validate(&a, &b),
      Err(Error::RuleViolation(_))
    ));
  }

  #[test]
  fn clubless_submitter_is_exempt_from_club_rule() {
    let a = student(1, 2, "CS");
    let mut b = student(2, 3, "Math");
    b.clubs = names(&["Chess Club"]);
    assert!(PromptKind::DifferentYearSameClub.validate(&a, &b).is_ok());
  }

  #[test]
  fn club_rule_enforced_when_submitter_has_clubs() {
    let mut a = student(1, 2, "CS");
    a.clubs = names(&["Drama Club"]);
    let mut b = student(2, 3, "Math");
    b.clubs = names(&["Chess Club"]);
    assert!(matches!(
      PromptKind::DifferentYearSameClub.validate(&a, &b),
      Err(Error::RuleViolation(m)) if m.contains("clubs")
    ));
  }

  #[test]
  fn custom_accepts_anyone_but_self() {
    let a = student(1, 1, "CS");
    let b = student(2, 4, "Law");
    assert!(PromptKind::Custom.validate(&a, &b).is_ok());
    assert!(PromptKind::Custom.validate(&a, &a).is_err());
  }

  // ─── Candidates ────────────────────────────────────────────────────────────

  #[test]
  fn candidates_exclude_user() {
    let a = student(1, 1, "CS");
    let all = vec![a.clone(), student(2, 1, "CS"), student(3, 1, "Math")];

    let same = PromptKind::SameFaculty.candidates(&a, all.clone()).unwrap();
    assert_eq!(same.iter().map(|s| s.id).collect::<Vec<_>>(), vec![2]);

    let any = PromptKind::Custom.candidates(&a, all).unwrap();
    assert_eq!(any.iter().map(|s| s.id).collect::<Vec<_>>(), vec![2, 3]);
  }

  #[test]
  fn language_and_hobby_needs_both_on_user() {
    let mut a = student(1, 1, "CS");
    a.languages = names(&["English"]);
    let err = PromptKind::SameLanguageAndHobby
      .candidates(&a, vec![])
      .unwrap_err();
    assert!(matches!(err, Error::MissingPrerequisite(_)));
  }

  #[test]
  fn different_year_candidates_need_shared_club() {
    let mut a = student(1, 2, "CS");
    a.clubs = names(&["Chess Club"]);
    let mut same_club_other_year = student(2, 3, "CS");
    same_club_other_year.clubs = names(&["Chess Club", "Book Club"]);
    let mut same_club_same_year = student(3, 2, "CS");
    same_club_same_year.clubs = names(&["Chess Club"]);
    let other_year_no_club = student(4, 1, "CS");

    let got = PromptKind::DifferentYearSameClub
      .candidates(&a, vec![
        same_club_other_year,
        same_club_same_year,
        other_year_no_club,
      ])
      .unwrap();
    assert_eq!(got.iter().map(|s| s.id).collect::<Vec<_>>(), vec![2]);
  }

  #[test]
  fn different_year_without_clubs_is_missing_prerequisite() {
    let a = student(1, 2, "CS");
    assert!(matches!(
      PromptKind::DifferentYearSameClub.check_prerequisites(&a),
      Err(Error::MissingPrerequisite(_))
    ));
  }
}
