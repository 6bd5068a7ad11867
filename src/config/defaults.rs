//! Built-in inputs used when no post or resume source is configured.

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "o4-mini";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

pub const DEFAULT_REFERENCE_TECHS: &[&str] = &[
    "React",
    "Next.js",
    "Redux",
    "TypeScript",
    "JavaScript",
    "Tailwind CSS",
    "Jest",
    "Playwright",
    "Node.js",
    "Express",
    "Nest.js",
    "Redis",
    "GraphQL",
    "PostgreSQL",
    "MySQL",
    "MongoDB",
    "AWS",
    "Docker",
];

pub fn default_reference_techs() -> Vec<String> {
    DEFAULT_REFERENCE_TECHS.iter().map(|t| t.to_string()).collect()
}

pub const DEFAULT_RESUME: &str = "Front end React, Next.js, Redux
TypeScript & JavaScript
Figma to code & Animations
Tanstack/React Query & SWR
Tailwind CSS, Bootstrap, MaterialUI, Ant Design, PrimeReact
PostCSS, Webpack, Vite
Jest & Playwright
Progressive Web App (PWA) backend Node.js, Express, Nest.js
TypeScript
Redis
REST & GraphQL APIs
PostgreSQL, MySQL, Oracle
MongoDB, Amazon DocumentDB
MVC, DDD, Clean & Event-Driven Arch.
AWS, Vercel, Heroku
SonarQube
Docker, Rancher
GitHub Actions & Bitbucket Pipelines
Sentry
CloudWatch
Google Analytics
Error Handling & Log Monitoring
Cursor, OpenAI
LangChain & LangGraph & LangSmith";

pub const DEFAULT_POST: &str = "We're Hiring: Senior Machine Learning Engineer (LLMs & Infrastructure)

We're looking for a Senior ML Engineer to help us build smart, scalable NLP solutions using the latest deep learning and MLOps tools.

USD pay | Contractor role | 100% Remote (Latam)

What you'll do:
Build real-time NLP agents with BERT, SmallBERT, and Hugging Face TGI.
Deploy and manage models at scale on Azure AKS (GPU support) using Kubernetes & Helm.
Develop high-performance APIs with FastAPI.
Automate workflows with CI/CD pipelines (Azure DevOps).

What we're looking for:
React, Next.js, Typescript, Tailwind CSS,
Nest, Node, Jest,
5+ years in ML or software engineering.
Strong Python skills (3.x).
Experience with ML infrastructure, deployment, and cloud GPUs (Azure preferred).
Bonus: knowledge of C++, C#, or Rust.";
