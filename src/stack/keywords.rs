//! Keyword → technology lookup table
//!
//! One finite table drives both manifest dependency matching and content
//! sniffing. Needles are lower-case and matched as substrings, except for
//! short names that also occur inside ordinary words ("expression",
//! "guardrails"); those only match when not surrounded by letters or digits.

use crate::models::StackCategory;

pub struct Technology {
    pub name: &'static str,
    pub category: StackCategory,
    pub needles: &'static [&'static str],
    pub whole_word: bool,
}

const fn tech(
    name: &'static str,
    category: StackCategory,
    needles: &'static [&'static str],
) -> Technology {
    Technology {
        name,
        category,
        needles,
        whole_word: false,
    }
}

const fn word(
    name: &'static str,
    category: StackCategory,
    needles: &'static [&'static str],
) -> Technology {
    Technology {
        name,
        category,
        needles,
        whole_word: true,
    }
}

use StackCategory::*;

pub const TECHNOLOGIES: &[Technology] = &[
    // Backend
    tech("FastAPI", Backend, &["fastapi"]),
    tech("Django", Backend, &["django"]),
    tech("Flask", Backend, &["flask"]),
    word("Express", Backend, &["express"]),
    tech("NestJS", Backend, &["@nestjs"]),
    tech("Fastify", Backend, &["fastify"]),
    tech("Spring Boot", Backend, &["springframework", "spring-boot"]),
    tech("Laravel", Backend, &["laravel"]),
    word("Rails", Backend, &["rails"]),
    tech("Gin", Backend, &["gin-gonic"]),
    tech("Actix", Backend, &["actix"]),
    tech("Axum", Backend, &["axum"]),
    // Frontend
    word("React", Frontend, &["react"]),
    tech("Next.js", Frontend, &["next.config", "\"next\"", "next/"]),
    word("Vue", Frontend, &["vue"]),
    tech("Angular", Frontend, &["@angular"]),
    tech("Svelte", Frontend, &["svelte"]),
    tech("Tailwind CSS", Frontend, &["tailwindcss"]),
    tech("Vite", Frontend, &["vitejs", "vite.config"]),
    // Database
    tech("PostgreSQL", Database, &["postgres", "psycopg", "asyncpg"]),
    tech("MySQL", Database, &["mysql"]),
    tech("SQLite", Database, &["sqlite"]),
    tech("MongoDB", Database, &["mongodb", "pymongo", "mongoose"]),
    tech("Redis", Database, &["redis"]),
    tech("SQLAlchemy", Database, &["sqlalchemy"]),
    tech("Prisma", Database, &["prisma"]),
    tech("Elasticsearch", Database, &["elasticsearch"]),
    // Infrastructure
    tech("Docker", Infrastructure, &["docker"]),
    tech("Kubernetes", Infrastructure, &["kubernetes", "kubectl"]),
    tech("Terraform", Infrastructure, &["terraform"]),
    tech("Nginx", Infrastructure, &["nginx"]),
    tech("AWS", Infrastructure, &["boto3", "aws-sdk", "@aws-sdk"]),
    tech("Google Cloud", Infrastructure, &["google-cloud", "@google-cloud"]),
    // Testing
    tech("pytest", Testing, &["pytest"]),
    word("Jest", Testing, &["jest"]),
    tech("Vitest", Testing, &["vitest"]),
    word("Mocha", Testing, &["mocha"]),
    tech("Cypress", Testing, &["cypress"]),
    tech("Playwright", Testing, &["playwright"]),
    tech("JUnit", Testing, &["junit"]),
    // AI/ML
    tech("PyTorch", AiMl, &["torch"]),
    tech("TensorFlow", AiMl, &["tensorflow"]),
    tech("scikit-learn", AiMl, &["sklearn", "scikit-learn"]),
    tech("Pandas", AiMl, &["pandas"]),
    tech("NumPy", AiMl, &["numpy"]),
    tech("Hugging Face", AiMl, &["transformers", "huggingface"]),
    tech("OpenAI", AiMl, &["openai"]),
    tech("LangChain", AiMl, &["langchain"]),
    word("Groq", AiMl, &["groq"]),
    // Tools
    tech("Celery", Tools, &["celery"]),
    tech("Kafka", Tools, &["kafka"]),
    tech("RabbitMQ", Tools, &["rabbitmq", "pika", "amqplib"]),
    tech("GraphQL", Tools, &["graphql"]),
    tech("Pydantic", Tools, &["pydantic"]),
    tech("Alembic", Tools, &["alembic"]),
    tech("ESLint", Tools, &["eslint"]),
    tech("Prettier", Tools, &["prettier"]),
    tech("Webpack", Tools, &["webpack"]),
];

impl Technology {
    fn found_in(&self, haystack: &str) -> bool {
        self.needles.iter().any(|needle| {
            if self.whole_word {
                contains_word(haystack, needle)
            } else {
                haystack.contains(needle)
            }
        })
    }
}

/// `needle` occurs with no ASCII letter or digit directly on either side
fn contains_word(haystack: &str, needle: &str) -> bool {
    let bytes = haystack.as_bytes();
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = start.checked_sub(1).map(|i| bytes[i]);
        let after = bytes.get(end).copied();
        !before.is_some_and(|b| b.is_ascii_alphanumeric())
            && !after.is_some_and(|b| b.is_ascii_alphanumeric())
    })
}

/// Every technology whose needles occur in `haystack` (already lower-cased)
pub fn matches(haystack: &str) -> impl Iterator<Item = &'static Technology> + '_ {
    TECHNOLOGIES.iter().filter(move |t| t.found_in(haystack))
}

/// Language implied by a source extension
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "py" | "pyi" => Some("Python"),
        "js" | "jsx" | "mjs" | "cjs" => Some("JavaScript"),
        "ts" | "tsx" => Some("TypeScript"),
        "go" => Some("Go"),
        "rs" => Some("Rust"),
        "java" => Some("Java"),
        "kt" | "kts" => Some("Kotlin"),
        "php" => Some("PHP"),
        "rb" => Some("Ruby"),
        "cs" => Some("C#"),
        "c" | "h" => Some("C"),
        "cpp" | "cc" | "hpp" => Some("C++"),
        "swift" => Some("Swift"),
        "scala" => Some("Scala"),
        _ => None,
    }
}
