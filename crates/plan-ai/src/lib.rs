use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1";
pub const DEFAULT_CHAT_MODEL: &str = "google/gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "google/gemini-2.5-flash-image";

pub const COST_SYSTEM_PROMPT: &str = "You are a construction cost estimation expert.
Provide detailed and realistic cost estimates for home construction projects.
Always respond with a valid JSON object containing the cost breakdown.";

pub const CHAT_SYSTEM_PROMPT: &str = "You are an AI construction assistant for home building projects.
Provide expert guidance on design, materials, cost planning, and construction best practices.
Keep answers practical and concise.";

pub const CONTRACTOR_SYSTEM_PROMPT: &str =
    "You are a contractor matching assistant. Always respond with valid JSON only, no markdown or code blocks.";

pub const DESIGNER_SYSTEM_PROMPT: &str =
    "You are a designer matching assistant. Always respond with valid JSON only, no markdown or code blocks.";

/// One turn of a chat-completions conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for the gateway's `/chat/completions` endpoint.
///
/// `modalities` is only serialized when set; the image model requires
/// `["image", "text"]`, text models reject the field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub message: CompletionMessage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub images: Vec<GeneratedImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedImage {
    pub image_url: ImageUrl,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ChatCompletion {
    /// Text content of the first choice, if the model returned any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }

    /// URL of the first generated image, if the model returned any.
    pub fn first_image_url(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.images.first())
            .map(|image| image.image_url.url.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayError {
    MissingApiKey,
    RateLimited,
    PaymentRequired,
    Upstream { status: u16, detail: String },
    Transport(String),
    Malformed(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::MissingApiKey => {
                write!(f, "AI_GATEWAY_API_KEY is not configured")
            }
            GatewayError::RateLimited => {
                write!(f, "Rate limit exceeded. Please try again later.")
            }
            GatewayError::PaymentRequired => {
                write!(f, "Payment required. Please add credits to your workspace.")
            }
            GatewayError::Upstream { status, detail } => {
                write!(f, "AI gateway error: {status} {detail}")
            }
            GatewayError::Transport(message) => {
                write!(f, "gateway request failed: {message}")
            }
            GatewayError::Malformed(message) => {
                write!(f, "invalid response format from AI: {message}")
            }
        }
    }
}

impl std::error::Error for GatewayError {}

/// Boundary to the chat-completions gateway. The planning engine and the
/// server are generic over this seam so tests can script replies.
#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion, GatewayError>;
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_key: String,
    pub chat_model: String,
    pub image_model: String,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }

    /// Reads the gateway configuration from the environment.
    ///
    /// `AI_GATEWAY_API_KEY` is required; `AI_GATEWAY_URL`,
    /// `AI_GATEWAY_CHAT_MODEL` and `AI_GATEWAY_IMAGE_MODEL` override the
    /// defaults.
    pub fn from_env() -> Result<Self, GatewayError> {
        let api_key = std::env::var("AI_GATEWAY_API_KEY").map_err(|_| GatewayError::MissingApiKey)?;
        let base_url =
            std::env::var("AI_GATEWAY_URL").unwrap_or_else(|_| DEFAULT_GATEWAY_URL.to_string());
        let chat_model = std::env::var("AI_GATEWAY_CHAT_MODEL")
            .unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string());
        let image_model = std::env::var("AI_GATEWAY_IMAGE_MODEL")
            .unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.to_string());
        Ok(Self {
            base_url,
            api_key,
            chat_model,
            image_model,
        })
    }
}

/// `reqwest`-backed gateway client posting to `{base_url}/chat/completions`
/// with a bearer key.
pub struct HttpGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait::async_trait]
impl ChatModel for HttpGateway {
    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion, GatewayError> {
        tracing::debug!(model = %request.model, "calling AI gateway");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|error| GatewayError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, detail = %detail, "AI gateway error");
            return Err(match status.as_u16() {
                429 => GatewayError::RateLimited,
                402 => GatewayError::PaymentRequired,
                code => GatewayError::Upstream {
                    status: code,
                    detail,
                },
            });
        }

        response
            .json::<ChatCompletion>()
            .await
            .map_err(|error| GatewayError::Malformed(error.to_string()))
    }
}

/// Inputs for a floor-plan image generation.
#[derive(Debug, Clone)]
pub struct DesignBrief {
    pub plot_length: f64,
    pub plot_width: f64,
    pub rooms: u32,
    pub floors: u32,
    pub style: String,
    pub open_area: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDesign {
    pub image_url: String,
}

#[derive(Debug, Clone)]
pub struct CostInputs {
    pub area: f64,
    pub quality: String,
    pub location: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Cost breakdown returned by the model. `currency` defaults to USD when
/// the reply omits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub materials: f64,
    pub labor: f64,
    pub equipment: f64,
    pub permits: f64,
    pub total: f64,
    pub details: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Free-text filters for contractor and designer matching. Empty strings
/// count as absent, matching the form boundary.
#[derive(Debug, Clone, Default)]
pub struct ProfileSearch {
    pub search_query: Option<String>,
    pub specialty: Option<String>,
    pub location: Option<String>,
    pub budget: Option<String>,
    pub project_details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractorProfile {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub location: String,
    pub rating: f64,
    pub reviews: u32,
    pub experience: String,
    pub phone: String,
    pub email: String,
    pub hourly_rate: String,
    pub description: String,
    pub verified: bool,
    pub certifications: Vec<String>,
    pub completed_projects: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignerProfile {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub location: String,
    pub rating: f64,
    pub reviews: u32,
    pub experience: String,
    pub phone: String,
    pub email: String,
    pub hourly_rate: String,
    pub description: String,
    pub verified: bool,
    pub certifications: Vec<String>,
    pub completed_projects: u32,
    pub portfolio_highlights: Vec<String>,
}

#[derive(Deserialize)]
struct ContractorList {
    contractors: Vec<ContractorProfile>,
}

#[derive(Deserialize)]
struct DesignerList {
    designers: Vec<DesignerProfile>,
}

/// Display title for a contractor specialty key offered by the search form.
pub fn contractor_specialty_title(key: &str) -> Option<&'static str> {
    match key {
        "general" => Some("General Contractor"),
        "plumber" => Some("Plumber"),
        "electrician" => Some("Electrician"),
        "mason" => Some("Mason"),
        "carpenter" => Some("Carpenter"),
        "painter" => Some("Painter"),
        "hvac" => Some("HVAC Specialist"),
        "roofing" => Some("Roofing Contractor"),
        "architect" => Some("Architect"),
        "interior" => Some("Interior Designer"),
        _ => None,
    }
}

/// Display title for a designer specialty key offered by the search form.
pub fn designer_specialty_title(key: &str) -> Option<&'static str> {
    match key {
        "interior" => Some("Interior Designer"),
        "architect" => Some("Architect"),
        "landscape" => Some("Landscape Designer"),
        "residential" => Some("Residential Designer"),
        "commercial" => Some("Commercial Designer"),
        "kitchen-bath" => Some("Kitchen & Bath Designer"),
        "sustainable" => Some("Sustainable Design Specialist"),
        "lighting" => Some("Lighting Designer"),
        "3d" => Some("3D Visualization Specialist"),
        "space-planning" => Some("Space Planning Expert"),
        _ => None,
    }
}

/// Builds the floor-plan image prompt from a validated brief.
pub fn design_prompt(brief: &DesignBrief) -> String {
    let total_area = brief.plot_length * brief.plot_width;
    let covered_area = total_area - brief.open_area;
    let floor_text = if brief.floors == 1 {
        "single-story".to_string()
    } else {
        format!("{}-story", brief.floors)
    };

    let mut prompt = format!(
        "Create a professional architectural floor plan for a {} style {} house.\n\
         Plot dimensions: {}ft x {}ft (Total: {} sq ft).\n\
         Number of rooms: {} across {} floor(s).\n",
        brief.style, floor_text, brief.plot_length, brief.plot_width, total_area, brief.rooms,
        brief.floors
    );

    if brief.open_area > 0.0 {
        prompt.push_str(&format!(
            "Open area required: {} sq ft (for lawn, courtyard, garden, or terrace).\n",
            brief.open_area
        ));
        prompt.push_str(&format!(
            "Covered/Built area per floor: {covered_area} sq ft.\n"
        ));
    }
    if brief.floors > 1 {
        prompt.push_str(&format!(
            "Show floor plans for all {} floors separately or stacked view with labels (Ground Floor, First Floor, etc.).\n",
            brief.floors
        ));
        prompt.push_str("Include staircase placement connecting the floors.\n");
    }
    prompt.push_str(
        "The floor plan should be a top-down 2D view with clear room labels, dimensions, doors, and windows.\n\
         Use a clean architectural drawing style with black lines on white background.\n",
    );
    prompt.push_str(&format!(
        "Include bedroom(s), bathroom(s), kitchen, living room, and other necessary spaces distributed across {} floor(s).\n",
        brief.floors
    ));
    if brief.open_area > 0.0 {
        prompt.push_str(
            "Mark the open area clearly (lawn/courtyard/garden) separate from the built structure.\n",
        );
    }
    prompt.push_str("Show proper spacing and realistic room proportions for each floor.");
    prompt
}

/// Builds the cost-breakdown prompt. The reply must carry the exact keys
/// of [`CostEstimate`] so the JSON extraction can deserialize it.
pub fn cost_prompt(inputs: &CostInputs) -> String {
    format!(
        "Estimate construction costs for:\n\
         - Total Area: {} sq ft\n\
         - Quality Level: {}\n\
         - Location: {}\n\
         \n\
         Provide a detailed breakdown in JSON format with these exact keys:\n\
         {{\n\
           \"materials\": number (in USD),\n\
           \"labor\": number (in USD),\n\
           \"equipment\": number (in USD),\n\
           \"permits\": number (in USD),\n\
           \"total\": number (in USD),\n\
           \"details\": string (brief explanation of estimates),\n\
           \"currency\": string (ISO 4217 code, e.g. \"USD\")\n\
         }}",
        inputs.area, inputs.quality, inputs.location
    )
}

fn search_criteria(search: &ProfileSearch) -> String {
    let mut lines = Vec::new();
    if let Some(query) = present(&search.search_query) {
        lines.push(format!("Search query: {query}"));
    }
    if let Some(specialty) = present(&search.specialty) {
        lines.push(format!("Specialty: {specialty}"));
    }
    if let Some(location) = present(&search.location) {
        lines.push(format!("Location: {location}"));
    }
    if let Some(budget) = present(&search.budget) {
        lines.push(format!("Budget range: {budget}"));
    }
    if let Some(details) = present(&search.project_details) {
        lines.push(format!("Project details: {details}"));
    }
    lines.join("\n")
}

#[inline]
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

fn resolved_specialty<'a>(
    search: &'a ProfileSearch,
    table: fn(&str) -> Option<&'static str>,
    fallback: &'a str,
) -> &'a str {
    match present(&search.specialty) {
        Some(key) => table(key).unwrap_or(key),
        None => present(&search.search_query).unwrap_or(fallback),
    }
}

/// Builds the contractor matching prompt.
pub fn contractor_prompt(search: &ProfileSearch) -> String {
    let specialty_name = resolved_specialty(search, contractor_specialty_title, "General Contractor");
    let search_location = present(&search.location).unwrap_or("Pakistan");

    format!(
        "You are a contractor matching AI assistant for construction projects in Pakistan.\n\
         Generate a list of 6 realistic contractors based on these search criteria:\n\
         \n\
         {criteria}\n\
         \n\
         REQUIREMENTS:\n\
         - Generate contractors with realistic Pakistani/local names\n\
         - All contractors should be based in or near: {search_location}\n\
         - Primary specialty should be: {specialty_name}\n\
         - Use Pakistani phone format: +92-3XX-XXXXXXX\n\
         - Use professional email addresses\n\
         - Hourly rates in Pakistani Rupees (Rs 500-3000/hour based on specialty and experience)\n\
         - Ratings between 4.0-5.0\n\
         - Reviews between 15-150\n\
         - Experience between 5-20 years\n\
         - Some should be verified (verified: true), others not\n\
         - Include 2-4 relevant certifications per contractor\n\
         - Completed projects between 20-200\n\
         - Brief professional descriptions (2-3 sentences) that highlight expertise\n\
         \n\
         SPECIALTY GUIDELINES:\n\
         - General Contractor: Rs 1200-2500/hour, certifications like \"Licensed Contractor\", \"PEC Registered\"\n\
         - Plumber: Rs 800-1500/hour, certifications like \"Plumbing License\", \"Gas Line Certified\"\n\
         - Electrician: Rs 900-1800/hour, certifications like \"Licensed Electrician\", \"High Voltage Certified\"\n\
         - Mason: Rs 700-1400/hour, certifications like \"Masonry Expert\", \"Structural Work Certified\"\n\
         - Carpenter: Rs 800-1600/hour, certifications like \"Carpentry Master\", \"Furniture Design Certified\"\n\
         - Painter: Rs 600-1200/hour, certifications like \"Professional Painter\", \"Interior Finish Specialist\"\n\
         - HVAC: Rs 1000-2000/hour, certifications like \"HVAC Certified\", \"Refrigeration Expert\"\n\
         - Roofing: Rs 900-1700/hour, certifications like \"Roofing Specialist\", \"Waterproofing Expert\"\n\
         - Architect: Rs 2000-3500/hour, certifications like \"PEC Registered Architect\", \"RIBA Member\"\n\
         - Interior Designer: Rs 1500-3000/hour, certifications like \"Certified Interior Designer\", \"IIDA Member\"\n\
         \n\
         You must respond with ONLY valid JSON - no markdown, no code blocks, no backticks, just raw JSON.\n\
         \n\
         Return ONLY this JSON structure:\n\
         {{\n\
           \"contractors\": [\n\
             {{\n\
               \"id\": \"unique-string-id\",\n\
               \"name\": \"Full Pakistani Name\",\n\
               \"specialty\": \"Exact Specialty Title\",\n\
               \"location\": \"City, Area, Pakistan\",\n\
               \"rating\": 4.7,\n\
               \"reviews\": 89,\n\
               \"experience\": \"10 years\",\n\
               \"phone\": \"+92-3XX-XXXXXXX\",\n\
               \"email\": \"professional@email.com\",\n\
               \"hourlyRate\": \"Rs 1,500/hour\",\n\
               \"description\": \"Professional description highlighting expertise and experience...\",\n\
               \"verified\": true,\n\
               \"certifications\": [\"Certification 1\", \"Certification 2\", \"Certification 3\"],\n\
               \"completedProjects\": 134\n\
             }}\n\
           ]\n\
         }}",
        criteria = search_criteria(search),
    )
}

/// Builds the designer matching prompt.
pub fn designer_prompt(search: &ProfileSearch) -> String {
    let specialty_name = resolved_specialty(search, designer_specialty_title, "Interior Designer");
    let search_location = present(&search.location).unwrap_or("Pakistan");

    format!(
        "You are a designer matching AI assistant for construction and interior design projects in Pakistan.\n\
         Generate a list of 6 realistic designers based on these search criteria:\n\
         \n\
         {criteria}\n\
         \n\
         REQUIREMENTS:\n\
         - Generate designers with realistic Pakistani/local names\n\
         - All designers should be based in or near: {search_location}\n\
         - Primary specialty should be: {specialty_name}\n\
         - Use Pakistani phone format: +92-3XX-XXXXXXX\n\
         - Use professional email addresses\n\
         - Hourly rates in Pakistani Rupees (Rs 1500-5000/hour based on specialty and experience)\n\
         - Ratings between 4.2-5.0\n\
         - Reviews between 20-180\n\
         - Experience between 5-20 years\n\
         - Some should be verified (verified: true), others not\n\
         - Include 2-4 relevant certifications per designer\n\
         - Completed projects between 25-250\n\
         - Brief professional descriptions (2-3 sentences) that highlight design philosophy and expertise\n\
         - Include 3-5 portfolio highlights for each designer (e.g., \"Luxury Villa Design\", \"Modern Office Space\", \"Eco-Friendly Home\")\n\
         \n\
         SPECIALTY GUIDELINES:\n\
         - Interior Designer: Rs 2000-4000/hour, certifications like \"NCIDQ Certified\", \"Certified Interior Designer\", \"IIDA Member\"\n\
         - Architect: Rs 2500-5000/hour, certifications like \"PEC Registered Architect\", \"RIBA Member\", \"LEED Accredited\"\n\
         - Landscape Designer: Rs 1800-3500/hour, certifications like \"Landscape Architecture License\", \"Sustainable Design Certified\"\n\
         - Residential Designer: Rs 1800-3500/hour, certifications like \"Residential Design Specialist\", \"Custom Home Expert\"\n\
         - Commercial Designer: Rs 2200-4500/hour, certifications like \"Commercial Design Certified\", \"Retail Space Expert\"\n\
         - Kitchen & Bath Designer: Rs 1500-3000/hour, certifications like \"NKBA Certified\", \"Kitchen Design Professional\"\n\
         - Sustainable Design Specialist: Rs 2000-4000/hour, certifications like \"LEED AP\", \"Green Building Certified\"\n\
         - Lighting Designer: Rs 1800-3500/hour, certifications like \"Lighting Design Certified\", \"IES Member\"\n\
         - 3D Visualization Specialist: Rs 2000-3800/hour, certifications like \"3D Rendering Expert\", \"CAD Certified\"\n\
         - Space Planning Expert: Rs 1900-3600/hour, certifications like \"Space Planning Certified\", \"Ergonomics Specialist\"\n\
         \n\
         Portfolio highlights should be relevant to the specialty and impressive project types.\n\
         \n\
         You must respond with ONLY valid JSON - no markdown, no code blocks, no backticks, just raw JSON.\n\
         \n\
         Return ONLY this JSON structure:\n\
         {{\n\
           \"designers\": [\n\
             {{\n\
               \"id\": \"unique-string-id\",\n\
               \"name\": \"Full Pakistani Name\",\n\
               \"specialty\": \"Exact Specialty Title\",\n\
               \"location\": \"City, Area, Pakistan\",\n\
               \"rating\": 4.8,\n\
               \"reviews\": 124,\n\
               \"experience\": \"12 years\",\n\
               \"phone\": \"+92-3XX-XXXXXXX\",\n\
               \"email\": \"professional@email.com\",\n\
               \"hourlyRate\": \"Rs 2,500/hour\",\n\
               \"description\": \"Professional description highlighting design philosophy and expertise...\",\n\
               \"verified\": true,\n\
               \"certifications\": [\"Certification 1\", \"Certification 2\", \"Certification 3\"],\n\
               \"completedProjects\": 156,\n\
               \"portfolioHighlights\": [\"Project Type 1\", \"Project Type 2\", \"Project Type 3\", \"Project Type 4\"]\n\
             }}\n\
           ]\n\
         }}",
        criteria = search_criteria(search),
    )
}

/// Extracts the outermost `{...}` span from a model reply. Tolerates
/// markdown fences and surrounding prose.
pub fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&reply[start..=end])
}

/// Planning operations over a chat model. One prompt build, one gateway
/// call, one tolerant parse per operation; failed calls surface as errors
/// without retrying.
pub struct PlanningAssistant<C: ChatModel> {
    model: C,
    chat_model: String,
    image_model: String,
}

impl<C: ChatModel> PlanningAssistant<C> {
    pub fn new(model: C) -> Self {
        Self {
            model,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }

    pub fn with_models(
        mut self,
        chat_model: impl Into<String>,
        image_model: impl Into<String>,
    ) -> Self {
        self.chat_model = chat_model.into();
        self.image_model = image_model.into();
        self
    }

    pub fn into_model(self) -> C {
        self.model
    }

    pub async fn generate_design(
        &self,
        brief: &DesignBrief,
    ) -> Result<GeneratedDesign, GatewayError> {
        let completion = self
            .model
            .complete(ChatRequest {
                model: self.image_model.clone(),
                messages: vec![ChatMessage::user(design_prompt(brief))],
                modalities: Some(vec!["image".to_string(), "text".to_string()]),
            })
            .await?;

        let image_url = completion
            .first_image_url()
            .ok_or_else(|| GatewayError::Malformed("No image generated".to_string()))?;
        Ok(GeneratedDesign {
            image_url: image_url.to_string(),
        })
    }

    pub async fn estimate_cost(&self, inputs: &CostInputs) -> Result<CostEstimate, GatewayError> {
        let completion = self
            .model
            .complete(ChatRequest {
                model: self.chat_model.clone(),
                messages: vec![
                    ChatMessage::system(COST_SYSTEM_PROMPT),
                    ChatMessage::user(cost_prompt(inputs)),
                ],
                modalities: None,
            })
            .await?;

        let content = completion
            .first_content()
            .ok_or_else(|| GatewayError::Malformed("No response from AI".to_string()))?;
        let json = extract_json_object(content)
            .ok_or_else(|| GatewayError::Malformed("no JSON object in reply".to_string()))?;
        serde_json::from_str(json).map_err(|error| GatewayError::Malformed(error.to_string()))
    }

    pub async fn chat_reply(&self, transcript: &[ChatMessage]) -> Result<String, GatewayError> {
        let mut messages = Vec::with_capacity(transcript.len() + 1);
        messages.push(ChatMessage::system(CHAT_SYSTEM_PROMPT));
        messages.extend_from_slice(transcript);

        let completion = self
            .model
            .complete(ChatRequest {
                model: self.chat_model.clone(),
                messages,
                modalities: None,
            })
            .await?;

        completion
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| GatewayError::Malformed("No response from AI".to_string()))
    }

    pub async fn find_contractors(
        &self,
        search: &ProfileSearch,
    ) -> Result<Vec<ContractorProfile>, GatewayError> {
        let json = self
            .matching_reply(CONTRACTOR_SYSTEM_PROMPT, contractor_prompt(search))
            .await?;
        let list: ContractorList = serde_json::from_str(&json)
            .map_err(|error| GatewayError::Malformed(error.to_string()))?;
        Ok(list.contractors)
    }

    pub async fn find_designers(
        &self,
        search: &ProfileSearch,
    ) -> Result<Vec<DesignerProfile>, GatewayError> {
        let json = self
            .matching_reply(DESIGNER_SYSTEM_PROMPT, designer_prompt(search))
            .await?;
        let list: DesignerList = serde_json::from_str(&json)
            .map_err(|error| GatewayError::Malformed(error.to_string()))?;
        Ok(list.designers)
    }

    async fn matching_reply(
        &self,
        system_prompt: &str,
        user_prompt: String,
    ) -> Result<String, GatewayError> {
        let completion = self
            .model
            .complete(ChatRequest {
                model: self.chat_model.clone(),
                messages: vec![
                    ChatMessage::system(system_prompt),
                    ChatMessage::user(user_prompt),
                ],
                modalities: None,
            })
            .await?;

        let content = completion
            .first_content()
            .ok_or_else(|| GatewayError::Malformed("No response received from AI".to_string()))?;
        extract_json_object(content)
            .map(str::to_string)
            .ok_or_else(|| GatewayError::Malformed("no JSON object in reply".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::{
        ChatCompletion, ChatMessage, ChatModel, ChatRequest, CompletionChoice, CompletionMessage,
        CostInputs, DEFAULT_CHAT_MODEL, DEFAULT_IMAGE_MODEL, DesignBrief, GatewayConfig,
        GatewayError, GeneratedImage, ImageUrl, PlanningAssistant, ProfileSearch,
        contractor_prompt, contractor_specialty_title, cost_prompt, design_prompt,
        designer_prompt, designer_specialty_title, extract_json_object,
    };

    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<ChatCompletion, GatewayError>>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<ChatCompletion, GatewayError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn with_content(text: &str) -> Self {
            Self::new(vec![Ok(completion_with_content(text))])
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion, GatewayError> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GatewayError::Transport("no scripted reply".to_string())))
        }
    }

    fn completion_with_content(text: &str) -> ChatCompletion {
        ChatCompletion {
            choices: vec![CompletionChoice {
                message: CompletionMessage {
                    content: Some(text.to_string()),
                    images: Vec::new(),
                },
            }],
        }
    }

    fn completion_with_image(url: &str) -> ChatCompletion {
        ChatCompletion {
            choices: vec![CompletionChoice {
                message: CompletionMessage {
                    content: None,
                    images: vec![GeneratedImage {
                        image_url: ImageUrl {
                            url: url.to_string(),
                        },
                    }],
                },
            }],
        }
    }

    fn sample_brief() -> DesignBrief {
        DesignBrief {
            plot_length: 50.0,
            plot_width: 40.0,
            rooms: 4,
            floors: 2,
            style: "modern".to_string(),
            open_area: 400.0,
        }
    }

    #[test]
    fn design_prompt_includes_required_components() {
        let prompt = design_prompt(&sample_brief());
        assert!(prompt.contains("modern style 2-story house"));
        assert!(prompt.contains("Plot dimensions: 50ft x 40ft (Total: 2000 sq ft)"));
        assert!(prompt.contains("Number of rooms: 4 across 2 floor(s)"));
        assert!(prompt.contains("Open area required: 400 sq ft"));
        assert!(prompt.contains("Covered/Built area per floor: 1600 sq ft"));
        assert!(prompt.contains("Include staircase placement connecting the floors."));
        assert!(prompt.contains("black lines on white background"));
    }

    #[test]
    fn design_prompt_single_story_without_open_area() {
        let brief = DesignBrief {
            floors: 1,
            open_area: 0.0,
            ..sample_brief()
        };
        let prompt = design_prompt(&brief);
        assert!(prompt.contains("single-story house"));
        assert!(!prompt.contains("Open area required"));
        assert!(!prompt.contains("staircase"));
        assert!(!prompt.contains("stacked view"));
    }

    #[test]
    fn cost_prompt_lists_the_exact_breakdown_keys() {
        let prompt = cost_prompt(&CostInputs {
            area: 1600.0,
            quality: "premium".to_string(),
            location: "Lahore".to_string(),
        });
        assert!(prompt.contains("- Total Area: 1600 sq ft"));
        assert!(prompt.contains("- Quality Level: premium"));
        assert!(prompt.contains("- Location: Lahore"));
        for key in ["materials", "labor", "equipment", "permits", "total", "details", "currency"] {
            assert!(prompt.contains(&format!("\"{key}\"")), "missing key {key}");
        }
    }

    #[test]
    fn specialty_tables_are_closed_with_fallback() {
        assert_eq!(contractor_specialty_title("hvac"), Some("HVAC Specialist"));
        assert_eq!(contractor_specialty_title("welder"), None);
        assert_eq!(
            designer_specialty_title("kitchen-bath"),
            Some("Kitchen & Bath Designer")
        );
        assert_eq!(designer_specialty_title("feng-shui"), None);
    }

    #[test]
    fn contractor_prompt_resolves_specialty_and_location() {
        let search = ProfileSearch {
            specialty: Some("plumber".to_string()),
            location: Some("Karachi".to_string()),
            ..ProfileSearch::default()
        };
        let prompt = contractor_prompt(&search);
        assert!(prompt.contains("Primary specialty should be: Plumber"));
        assert!(prompt.contains("based in or near: Karachi"));
        assert!(prompt.contains("Specialty: plumber"));
    }

    #[test]
    fn contractor_prompt_defaults_without_filters() {
        let prompt = contractor_prompt(&ProfileSearch::default());
        assert!(prompt.contains("Primary specialty should be: General Contractor"));
        assert!(prompt.contains("based in or near: Pakistan"));
    }

    #[test]
    fn unknown_specialty_key_is_used_verbatim() {
        let search = ProfileSearch {
            specialty: Some("welder".to_string()),
            ..ProfileSearch::default()
        };
        let prompt = contractor_prompt(&search);
        assert!(prompt.contains("Primary specialty should be: welder"));
    }

    #[test]
    fn designer_prompt_asks_for_portfolio_highlights() {
        let prompt = designer_prompt(&ProfileSearch::default());
        assert!(prompt.contains("Primary specialty should be: Interior Designer"));
        assert!(prompt.contains("portfolioHighlights"));
        assert!(prompt.contains("portfolio highlights for each designer"));
    }

    #[test]
    fn extracts_json_from_plain_fenced_and_chatty_replies() {
        assert_eq!(extract_json_object(r#"{"a":1}"#), Some(r#"{"a":1}"#));
        assert_eq!(
            extract_json_object("```json\n{\"a\":1}\n```"),
            Some(r#"{"a":1}"#)
        );
        assert_eq!(
            extract_json_object("Here is your estimate:\n{\"a\": {\"b\": 2}}\nLet me know!"),
            Some(r#"{"a": {"b": 2}}"#)
        );
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[tokio::test]
    async fn generate_design_uses_the_image_model_with_modalities() {
        let model = ScriptedModel::new(vec![Ok(completion_with_image(
            "https://images.example/plan.png",
        ))]);
        let assistant = PlanningAssistant::new(model);

        let design = assistant.generate_design(&sample_brief()).await.unwrap();
        assert_eq!(design.image_url, "https://images.example/plan.png");

        let requests = assistant.into_model().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, DEFAULT_IMAGE_MODEL);
        assert_eq!(
            requests[0].modalities,
            Some(vec!["image".to_string(), "text".to_string()])
        );
        assert_eq!(requests[0].messages.len(), 1);
        assert_eq!(requests[0].messages[0].role, "user");
    }

    #[tokio::test]
    async fn generate_design_without_image_is_malformed() {
        let model = ScriptedModel::with_content("sorry, text only");
        let assistant = PlanningAssistant::new(model);

        let error = assistant
            .generate_design(&sample_brief())
            .await
            .unwrap_err();
        assert_eq!(
            error,
            GatewayError::Malformed("No image generated".to_string())
        );
    }

    #[tokio::test]
    async fn estimate_cost_parses_a_fenced_reply_and_defaults_currency() {
        let reply = "```json\n{\"materials\": 40000, \"labor\": 25000, \"equipment\": 8000, \
                     \"permits\": 2000, \"total\": 75000, \"details\": \"mid-range finish\"}\n```";
        let model = ScriptedModel::with_content(reply);
        let assistant = PlanningAssistant::new(model);

        let estimate = assistant
            .estimate_cost(&CostInputs {
                area: 1600.0,
                quality: "standard".to_string(),
                location: "Islamabad".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(estimate.total, 75000.0);
        assert_eq!(estimate.currency, "USD");
        assert_eq!(estimate.details, "mid-range finish");
    }

    #[tokio::test]
    async fn estimate_cost_sends_system_and_user_messages() {
        let model = ScriptedModel::with_content(
            "{\"materials\":1,\"labor\":1,\"equipment\":1,\"permits\":1,\"total\":4,\"details\":\"x\"}",
        );
        let assistant = PlanningAssistant::new(model);
        assistant
            .estimate_cost(&CostInputs {
                area: 900.0,
                quality: "basic".to_string(),
                location: "Multan".to_string(),
            })
            .await
            .unwrap();

        let requests = assistant.into_model().requests();
        assert_eq!(requests[0].model, DEFAULT_CHAT_MODEL);
        assert_eq!(requests[0].messages[0].role, "system");
        assert!(requests[0].messages[0].content.contains("cost estimation expert"));
        assert_eq!(requests[0].messages[1].role, "user");
        assert_eq!(requests[0].modalities, None);
    }

    #[tokio::test]
    async fn chat_reply_prepends_the_assistant_system_prompt() {
        let model = ScriptedModel::with_content("Use brick for the outer walls.");
        let assistant = PlanningAssistant::new(model);

        let transcript = vec![
            ChatMessage::user("What walls should I use?"),
            ChatMessage {
                role: "assistant".to_string(),
                content: "Tell me about your climate.".to_string(),
            },
            ChatMessage::user("Hot summers."),
        ];
        let reply = assistant.chat_reply(&transcript).await.unwrap();
        assert_eq!(reply, "Use brick for the outer walls.");

        let requests = assistant.into_model().requests();
        assert_eq!(requests[0].messages.len(), 4);
        assert_eq!(requests[0].messages[0].role, "system");
        assert!(requests[0].messages[0].content.contains("construction assistant"));
        assert_eq!(requests[0].messages[1..], transcript[..]);
    }

    #[tokio::test]
    async fn find_contractors_parses_camel_case_profiles() {
        let reply = r#"{"contractors": [{
            "id": "c-1",
            "name": "Ahmed Khan",
            "specialty": "Plumber",
            "location": "Karachi, Sindh, Pakistan",
            "rating": 4.6,
            "reviews": 42,
            "experience": "8 years",
            "phone": "+92-300-1234567",
            "email": "ahmed@example.com",
            "hourlyRate": "Rs 1,200/hour",
            "description": "Residential plumbing specialist.",
            "verified": true,
            "certifications": ["Plumbing License"],
            "completedProjects": 67
        }]}"#;
        let model = ScriptedModel::with_content(reply);
        let assistant = PlanningAssistant::new(model);

        let contractors = assistant
            .find_contractors(&ProfileSearch::default())
            .await
            .unwrap();
        assert_eq!(contractors.len(), 1);
        assert_eq!(contractors[0].name, "Ahmed Khan");
        assert_eq!(contractors[0].hourly_rate, "Rs 1,200/hour");
        assert!(contractors[0].verified);
        assert_eq!(contractors[0].completed_projects, 67);
    }

    #[tokio::test]
    async fn find_designers_requires_the_designers_array() {
        let model = ScriptedModel::with_content(r#"{"contractors": []}"#);
        let assistant = PlanningAssistant::new(model);

        let error = assistant
            .find_designers(&ProfileSearch::default())
            .await
            .unwrap_err();
        assert!(matches!(error, GatewayError::Malformed(_)));
    }

    #[tokio::test]
    async fn gateway_errors_pass_through_untouched() {
        let model = ScriptedModel::new(vec![Err(GatewayError::RateLimited)]);
        let assistant = PlanningAssistant::new(model);

        let error = assistant
            .chat_reply(&[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert_eq!(error, GatewayError::RateLimited);
    }

    mod http_gateway {
        use httpmock::prelude::*;

        use super::super::{
            ChatMessage, ChatModel, ChatRequest, GatewayConfig, GatewayError, HttpGateway,
        };

        fn request() -> ChatRequest {
            ChatRequest {
                model: "test-model".to_string(),
                messages: vec![ChatMessage::user("hello")],
                modalities: None,
            }
        }

        fn gateway_for(server: &MockServer) -> HttpGateway {
            HttpGateway::new(GatewayConfig::new(server.base_url(), "test-key"))
        }

        #[tokio::test]
        async fn posts_bearer_auth_and_parses_content() {
            let server = MockServer::start();
            let mock = server.mock(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer test-key")
                    .json_body_partial(r#"{"model": "test-model"}"#);
                then.status(200).json_body(serde_json::json!({
                    "choices": [{"message": {"content": "hello back"}}]
                }));
            });

            let completion = gateway_for(&server).complete(request()).await.unwrap();
            mock.assert();
            assert_eq!(completion.first_content(), Some("hello back"));
        }

        #[tokio::test]
        async fn maps_429_to_rate_limited() {
            let server = MockServer::start();
            server.mock(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(429).body("slow down");
            });

            let error = gateway_for(&server).complete(request()).await.unwrap_err();
            assert_eq!(error, GatewayError::RateLimited);
        }

        #[tokio::test]
        async fn maps_402_to_payment_required() {
            let server = MockServer::start();
            server.mock(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(402).body("no credits");
            });

            let error = gateway_for(&server).complete(request()).await.unwrap_err();
            assert_eq!(error, GatewayError::PaymentRequired);
        }

        #[tokio::test]
        async fn other_failures_carry_status_and_detail() {
            let server = MockServer::start();
            server.mock(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(503).body("upstream down");
            });

            let error = gateway_for(&server).complete(request()).await.unwrap_err();
            assert_eq!(
                error,
                GatewayError::Upstream {
                    status: 503,
                    detail: "upstream down".to_string(),
                }
            );
        }

        #[tokio::test]
        async fn base_url_with_trailing_slash_is_normalized() {
            let server = MockServer::start();
            let mock = server.mock(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(serde_json::json!({"choices": []}));
            });

            let config = GatewayConfig::new(format!("{}/", server.base_url()), "test-key");
            let completion = HttpGateway::new(config).complete(request()).await.unwrap();
            mock.assert();
            assert_eq!(completion.first_content(), None);
        }
    }

    #[test]
    fn gateway_config_carries_default_models() {
        let config = GatewayConfig::new("https://gateway.example/v1", "key");
        assert_eq!(config.chat_model, DEFAULT_CHAT_MODEL);
        assert_eq!(config.image_model, DEFAULT_IMAGE_MODEL);
    }
}
