// All LLM prompt constants for the assessment agents.
// Templates are filled with `str::replace`; document text is always substituted
// last so placeholders inside a CV cannot be expanded.

/// System prompt for CV parsing.
pub const CV_PARSER_SYSTEM: &str = "You are an expert CV and resume parser. \
    Extract structured information from CV text accurately. \
    Classify each skill's proficiency as beginner, intermediate, advanced or expert from context clues \
    such as years mentioned, project scope, leadership or mentoring, and certifications. \
    Use specific, granular skill categories; avoid generic terms like \"technical\".";

/// CV parsing prompt template. Replace `{cv_text}` before sending.
pub const CV_PARSER_PROMPT_TEMPLATE: &str = r#"Parse the following CV and extract all relevant information.

Return a JSON object with this EXACT schema (no extra fields):
{
  "name": "Jane Doe",
  "contact": {"email": "jane@example.com", "phone": null, "location": "Berlin"},
  "summary": "Backend engineer focused on distributed systems",
  "skills": [
    {"name": "Rust", "proficiency": "expert", "years_experience": 5, "category": "systems programming"}
  ],
  "experience": [
    {
      "title": "Senior Engineer",
      "employer": "Acme",
      "start_date": "2020-01",
      "end_date": null,
      "duration_months": 48,
      "achievements": ["Cut p99 latency by 40%"]
    }
  ],
  "education": [
    {"institution": "TU Berlin", "degree": "MSc", "field_of_study": "Computer Science", "graduation_year": 2018, "gpa": null}
  ],
  "certifications": [],
  "languages": ["English", "German"]
}

Rules:
- "proficiency" must be one of "beginner", "intermediate", "advanced", "expert" or null.
- "end_date" is null for a current position.
- Every experience entry needs a non-empty "title" and "employer".
- List skills and experience in the order they appear in the CV.

CV text:
{cv_text}"#;

/// System prompt for job description analysis.
pub const JOB_ANALYZER_SYSTEM: &str = "You are an expert job description analyst. \
    Parse and structure job descriptions, separating what is required from what is preferred. \
    Anything marked required, mandatory or must-have is required. \
    Anything marked preferred, bonus, nice-to-have, or qualified by 'ideally' or 'preferably' is preferred. \
    Example: \"4+ years experience, ideally in AI\" means \"4+ years experience\" is required and \"in AI\" is preferred.";

/// Job analysis prompt template. Replace `{job_text}` before sending.
pub const JOB_ANALYZER_PROMPT_TEMPLATE: &str = r#"Analyze the following job description and extract its requirements.

Return a JSON object with this EXACT schema (no extra fields):
{
  "title": "Staff Backend Engineer",
  "company": "Acme",
  "department": "Platform",
  "location": "Remote (EU)",
  "must_have": ["5+ years building backend services"],
  "nice_to_have": ["Fintech domain experience"],
  "required_skills": [{"name": "Rust", "proficiency": "advanced", "years_experience": 3, "category": "systems programming"}],
  "preferred_skills": [{"name": "Kubernetes", "proficiency": null, "years_experience": null, "category": "infrastructure"}],
  "responsibilities": ["Design and operate payment services"],
  "education": ["BSc in Computer Science or equivalent"],
  "leadership": ["Mentor engineers on the team"],
  "soft_skills": ["Clear written communication"],
  "salary_range": null
}

Rules:
- "title" is required and must not be empty.
- "leadership" is [] for an individual-contributor role.
- Keep list entries in the order the posting states them.

Job description:
{job_text}"#;

/// System prompt for skills matching.
pub const SKILLS_MATCHER_SYSTEM: &str = "You are an expert at matching candidate skills and qualifications to job requirements. \
    Weigh required skills at 70%, preferred skills at 20% and education at 10%. \
    Count equivalent technologies (React vs Vue, Python vs Ruby) as transferable, not matched. \
    Be objective and thorough.";

/// Skills matching prompt template.
/// Replace `{candidate_education}`, `{candidate_skills}`, `{candidate_experience}`,
/// `{job_requirements}`, `{overlap_matched}` and `{overlap_missing}` before sending.
pub const SKILLS_MATCHER_PROMPT_TEMPLATE: &str = r#"Analyze the match between the candidate's qualifications and the job requirements.

CANDIDATE EDUCATION:
{candidate_education}

CANDIDATE SKILLS:
{candidate_skills}

CANDIDATE WORK EXPERIENCE:
{candidate_experience}

JOB REQUIREMENTS:
{job_requirements}

EXACT NAME OVERLAP (computed, treat as fact):
Required skills listed verbatim on the CV: {overlap_matched}
Required skills not listed verbatim on the CV: {overlap_missing}

Return a JSON object with this EXACT schema (no extra fields):
{
  "matched_skills": ["Rust"],
  "missing_skills": ["Kafka"],
  "transferable_skills": ["RabbitMQ"],
  "gap_analysis": "Meets Rust and SQL requirements; no streaming platform experience beyond RabbitMQ.",
  "score": 0.72
}

Scoring rules:
- Missing required education should result in a low score (0.3-0.5).
- Candidates meeting education and all required skills score 0.8 or above; with preferred skills too, 0.9 or above.
- The penalty for missing required skills is proportional to the share missing: half missing scores below 0.5, a third missing below 0.6.
- Missing preferred skills has minimal impact.
- "score" must be between 0.0 and 1.0.
- In "gap_analysis", state which requirements are met and which are missing, and justify the score."#;

/// System prompt for experience evaluation.
pub const EXPERIENCE_EVALUATOR_SYSTEM: &str = "You are an expert at evaluating how relevant a candidate's work experience is to a target role. \
    Weigh required experience at 70%, preferred experience at 15% and experience quality \
    (scope, impact, progression) at 15%. \
    Never assume two different job titles or domains are equivalent; count only directly relevant experience.";

/// Experience evaluation prompt template.
/// Replace `{job_title}`, `{job_context}`, `{listed_years}` and `{candidate_experience}` before sending.
pub const EXPERIENCE_EVALUATOR_PROMPT_TEMPLATE: &str = r#"Evaluate the candidate's work experience for the target role.

TARGET ROLE: {job_title}

JOB REQUIREMENTS & RESPONSIBILITIES:
{job_context}

LISTED EXPERIENCE (sum of role durations on the CV, computed): {listed_years} years

CANDIDATE WORK EXPERIENCE:
{candidate_experience}

Return a JSON object with this EXACT schema (no extra fields):
{
  "total_years": 7.5,
  "relevant_years": 5.0,
  "level": "senior",
  "relevant_roles": ["Senior Engineer at Acme"],
  "key_achievements": ["Cut p99 latency by 40%"],
  "analysis": "Meets the 5-year backend requirement; no fintech exposure.",
  "score": 0.75
}

Scoring rules:
- "level" must be one of "junior", "mid", "senior", "lead".
- Missing or insufficient required experience scores 0.5 or below.
- Meeting all required experience scores 0.7 or above; with preferred experience too, 0.8 or above.
- "score" must be between 0.0 and 1.0; year figures must be non-negative.
- In "analysis", state which required experiences are met and which are missing, and justify the score."#;

/// System prompt for culture fit assessment.
pub const CULTURE_FIT_SYSTEM: &str = "You are an expert at assessing cultural fit and soft skills from CV information. \
    Soft skills are interpersonal and professional attributes such as communication, collaboration, \
    initiative, adaptability and a learning mindset. Programming languages, tools and technical domains \
    are NOT soft skills. Weigh leadership match at 40% and soft skills at 60%. \
    Base the assessment on concrete evidence in the CV, not assumptions.";

/// Culture fit prompt template.
/// Replace `{job_title}`, `{company}`, `{responsibilities}`, `{leadership}`, `{soft_skills}`,
/// `{candidate_name}`, `{summary}`, `{certifications}`, `{languages}` and
/// `{candidate_experience}` before sending.
pub const CULTURE_FIT_PROMPT_TEMPLATE: &str = r#"Assess the candidate's cultural fit for the role.

TARGET ROLE: {job_title}
Company: {company}

JOB RESPONSIBILITIES:
{responsibilities}

JOB LEADERSHIP REQUIREMENTS:
{leadership}

JOB SOFT SKILLS REQUIREMENTS:
{soft_skills}

CANDIDATE PROFILE:
Name: {candidate_name}
Summary: {summary}
Certifications: {certifications}
Languages: {languages}

CANDIDATE WORK EXPERIENCE:
{candidate_experience}

Return a JSON object with this EXACT schema (no extra fields):
{
  "soft_skills": ["Mentoring", "Cross-team communication"],
  "leadership_indicators": ["Led a team of 5 engineers"],
  "collaboration_notes": "Leadership requirement met; written communication evident from CV.",
  "score": 0.8
}

Scoring rules:
- Leadership required and demonstrated: 0.8-1.0. Leadership required but absent: 0.3-0.5.
- No leadership requirement: neutral, no penalty.
- Missing critical soft skills lowers the score.
- "score" must be between 0.0 and 1.0."#;

/// System prompt for the final narrative.
pub const FINAL_SCORER_SYSTEM: &str = "You are an expert hiring manager writing the final assessment of a candidate. \
    The overall score and recommendation have already been computed; do not change or restate them as numbers. \
    Give actionable, objective insights.";

/// Final narrative prompt template.
/// Replace `{candidate_name}`, `{job_title}`, `{overall_score}`, `{recommendation}`,
/// `{skills_score}`, `{matched}`, `{missing}`, `{skills_analysis}`,
/// `{experience_score}`, `{level}`, `{relevant_years}`, `{experience_analysis}`,
/// `{culture_score}`, `{soft_skills}` and `{culture_notes}` before sending.
pub const FINAL_SCORER_PROMPT_TEMPLATE: &str = r#"Write the final assessment for this candidate.

Candidate: {candidate_name}
Position: {job_title}
Overall score: {overall_score} ({recommendation})

1. SKILLS MATCH (score {skills_score})
   Matched: {matched}
   Missing: {missing}
   Analysis: {skills_analysis}

2. EXPERIENCE (score {experience_score})
   Level: {level}
   Relevant experience: {relevant_years} years
   Analysis: {experience_analysis}

3. CULTURE FIT (score {culture_score})
   Soft skills: {soft_skills}
   Notes: {culture_notes}

Return a JSON object with this EXACT schema (no extra fields):
{
  "strengths": ["3-5 key strengths"],
  "concerns": ["3-5 concerns or areas to explore in interview"],
  "summary": "Executive summary, 2-3 paragraphs."
}"#;
