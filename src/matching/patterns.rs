use std::collections::HashMap;
use std::sync::LazyLock;

use crate::matching::normalize::normalize;

/// One canonical profile field and the label/attribute variants that refer to it.
#[derive(Debug)]
pub struct PatternGroup {
    pub key: &'static str,
    pub patterns: &'static [&'static str],
}

// ============================================================================
// Dictionary: canonical key -> variants, in lookup order
// ============================================================================

pub static FIELD_PATTERNS: &[PatternGroup] = &[
    // Name
    PatternGroup {
        key: "firstName",
        patterns: &[
            "first_name", "firstname", "first-name", "fname", "given_name", "givenname",
            "first", "forename", "prenom", "nombre",
        ],
    },
    PatternGroup {
        key: "lastName",
        patterns: &[
            "last_name", "lastname", "last-name", "lname", "family_name", "familyname",
            "surname", "last", "apellido", "nom",
        ],
    },
    PatternGroup {
        key: "fullName",
        patterns: &[
            "full_name", "fullname", "full-name", "name", "your_name", "applicant_name",
            "candidate_name", "legal_name", "displayname",
        ],
    },
    // Contact
    PatternGroup {
        key: "email",
        patterns: &[
            "email", "e-mail", "email_address", "emailaddress", "mail", "correo",
            "email_id", "emailid", "useremail", "user_email", "work_email", "primary_email",
        ],
    },
    PatternGroup {
        key: "phone",
        patterns: &[
            "phone", "telephone", "tel", "phone_number", "phonenumber", "mobile",
            "cell", "cellphone", "mobile_phone", "contact_number", "primary_phone",
            "phone_num", "phonenum", "telefono", "numero",
        ],
    },
    // Address
    PatternGroup {
        key: "address",
        patterns: &[
            "address", "street", "street_address", "streetaddress", "address_line",
            "address1", "address_1", "street_line", "mailing_address", "home_address",
            "direccion",
        ],
    },
    PatternGroup {
        key: "city",
        patterns: &["city", "town", "locality", "ciudad", "ville"],
    },
    PatternGroup {
        key: "state",
        patterns: &["state", "province", "region", "administrative_area", "estado", "provincia"],
    },
    PatternGroup {
        key: "zipCode",
        patterns: &[
            "zip", "zipcode", "zip_code", "postal", "postal_code", "postalcode",
            "post_code", "postcode", "pin", "pincode",
        ],
    },
    PatternGroup {
        key: "country",
        patterns: &["country", "nation", "country_code", "pais", "location_country"],
    },
    // Professional
    PatternGroup {
        key: "currentJobTitle",
        patterns: &[
            "current_title", "currenttitle", "job_title", "jobtitle", "title",
            "position", "current_position", "role", "current_role", "designation",
            "headline", "professional_title", "occupation",
        ],
    },
    PatternGroup {
        key: "currentCompany",
        patterns: &[
            "current_company", "currentcompany", "company", "employer", "current_employer",
            "organization", "company_name", "companyname", "employer_name", "organisation",
            "most_recent_company", "latest_company",
        ],
    },
    // Links
    PatternGroup {
        key: "linkedinUrl",
        patterns: &[
            "linkedin", "linkedin_url", "linkedinurl", "linkedin_profile",
            "linkedin_link", "li_url", "profile_linkedin", "social_linkedin",
        ],
    },
    PatternGroup {
        key: "githubUrl",
        patterns: &[
            "github", "github_url", "githuburl", "github_profile", "github_link",
            "gh_url", "git_url", "giturl",
        ],
    },
    PatternGroup {
        key: "portfolioUrl",
        patterns: &[
            "portfolio", "website", "portfolio_url", "personal_website", "url",
            "homepage", "personal_url", "web_url", "site", "blog",
        ],
    },
    // Eligibility and preferences
    PatternGroup {
        key: "workAuthorization",
        patterns: &[
            "work_authorization", "workauthorization", "visa", "visa_status",
            "authorization", "eligible_to_work", "sponsorship", "work_permit",
            "immigration_status", "require_sponsorship", "authorized_to_work",
        ],
    },
    PatternGroup {
        key: "willingToRelocate",
        patterns: &[
            "relocate", "willing_to_relocate", "relocation", "open_to_relocation",
            "can_relocate", "willing_relocate", "open_relocation", "relocation_willing",
        ],
    },
    PatternGroup {
        key: "salaryExpectation",
        patterns: &[
            "salary", "salary_expectation", "expected_salary", "compensation",
            "desired_salary", "pay", "salary_requirements", "salary_desired",
            "compensation_expectation", "salary_range",
        ],
    },
    PatternGroup {
        key: "availableStartDate",
        patterns: &[
            "start_date", "startdate", "available_start", "availability",
            "available_date", "earliest_start", "notice_period", "when_start",
            "date_available", "available_from",
        ],
    },
    // Education
    PatternGroup {
        key: "degree",
        patterns: &[
            "degree", "education", "education_level", "highest_degree",
            "qualification", "academic_degree", "degree_type",
        ],
    },
    PatternGroup {
        key: "university",
        patterns: &[
            "university", "school", "college", "institution", "alma_mater",
            "school_name", "university_name", "institution_name", "college_name",
        ],
    },
    PatternGroup {
        key: "graduationYear",
        patterns: &[
            "graduation_year", "graduationyear", "grad_year", "year_graduated",
            "graduation_date", "grad_date", "year_of_graduation", "graduation",
        ],
    },
    PatternGroup {
        key: "gpa",
        patterns: &["gpa", "grade_point", "grades", "cgpa", "grade", "grade_average"],
    },
    PatternGroup {
        key: "fieldOfStudy",
        patterns: &[
            "field_of_study", "fieldofstudy", "major", "concentration",
            "specialization", "area_of_study", "course", "program", "discipline",
        ],
    },
    // Experience
    PatternGroup {
        key: "yearsOfExperience",
        patterns: &[
            "years_of_experience", "yearsofexperience", "experience",
            "total_experience", "years_experience", "work_experience",
            "exp_years", "professional_experience", "experience_years",
        ],
    },
    PatternGroup {
        key: "skills",
        patterns: &[
            "skills", "skill_set", "skillset", "technologies", "competencies",
            "technical_skills", "abilities", "expertise", "qualifications", "proficiencies",
        ],
    },
    PatternGroup {
        key: "summary",
        patterns: &[
            "summary", "about", "bio", "about_me", "professional_summary",
            "objective", "profile", "description", "about_yourself", "introduction",
        ],
    },
    PatternGroup {
        key: "coverLetter",
        patterns: &[
            "cover_letter", "coverletter", "cover", "motivation_letter",
            "application_letter", "letter", "message", "why_interested",
        ],
    },
];

/// Normalized pattern -> canonical key. The first group to claim a pattern keeps it.
pub static REVERSE_INDEX: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    let mut index = HashMap::new();
    for group in FIELD_PATTERNS {
        for pattern in group.patterns {
            index.entry(normalize(pattern)).or_insert(group.key);
        }
    }
    index
});

/// Dictionary with every pattern pre-normalized, in dictionary order.
pub static NORMALIZED_GROUPS: LazyLock<Vec<(&'static str, Vec<String>)>> = LazyLock::new(|| {
    FIELD_PATTERNS
        .iter()
        .map(|g| (g.key, g.patterns.iter().map(|p| normalize(p)).collect()))
        .collect()
});

/// Exact hit on an already-normalized string.
pub fn canonical_for(normalized: &str) -> Option<&'static str> {
    REVERSE_INDEX.get(normalized).copied()
}

pub fn patterns_for(key: &str) -> Option<&'static [&'static str]> {
    FIELD_PATTERNS
        .iter()
        .find(|g| g.key == key)
        .map(|g| g.patterns)
}

pub fn canonical_keys() -> impl Iterator<Item = &'static str> {
    FIELD_PATTERNS.iter().map(|g| g.key)
}
