//! Prompt templates for every decision-oracle contract method.
//!
//! All prompts are plain-text builders; the matching response parsers live
//! in [`super::parse`].

/// Context handed to the oracle when asking for the next supervisor action.
#[derive(Debug, Clone)]
pub struct DecisionContext {
    pub query: String,
    pub current_step_idx: usize,
    pub current_step_line: String,
    pub plan_summary: String,
    pub failure_summary: String,
    pub retries_used: u32,
    pub max_retries_per_step: u32,
    pub replan_count: u32,
    pub max_replans: u32,
    /// Hard constraints the oracle must respect; enforced again in code.
    pub constraints: Vec<String>,
}

pub fn decide_action(ctx: &DecisionContext) -> String {
    let constraints_block = if ctx.constraints.is_empty() {
        "- None".to_string()
    } else {
        ctx.constraints
            .iter()
            .map(|c| format!("- {c}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "You are the SUPERVISOR in a multi-agent research system.\n\
         \n\
         Your job: decide the SINGLE next action given the current state.\n\
         \n\
         You must output ONLY ONE of these tokens (no punctuation, no explanation):\n\
         EXECUTE\n\
         RETRY\n\
         SKIP\n\
         REPLAN\n\
         TERMINATE\n\
         \n\
         Definitions:\n\
         - EXECUTE: run the current plan step as-is.\n\
         - RETRY: retry the current plan step with a modified search query or angle.\n\
         - SKIP: skip the current plan step and move on.\n\
         - REPLAN: ask the planner to revise remaining plan given failures so far.\n\
         - TERMINATE: stop & proceed to report generation with best-effort evidence.\n\
         \n\
         Research query:\n{query}\n\
         \n\
         Current step index: {idx}\n\
         Current step:\n{step}\n\
         \n\
         Upcoming plan (from current index):\n{plan}\n\
         \n\
         Failures for current step (most recent last):\n{failures}\n\
         \n\
         Budgets:\n\
         - retries used for current step: {retries} (max {max_retries})\n\
         - replan count: {replans} (max {max_replans})\n\
         \n\
         Hard constraints you must respect:\n{constraints}\n\
         \n\
         Decision rules of thumb:\n\
         - If you can likely fix failure by changing search phrasing/scope => RETRY.\n\
         - If the plan is structurally wrong or missing needed steps => REPLAN.\n\
         - If the step is high-risk and blocking progress, and evidence is still sufficient overall => SKIP.\n\
         - If steps remain and no blockers => EXECUTE.\n\
         - If plan is done or further progress is impossible => TERMINATE.\n\
         \n\
         Return ONLY the action token.",
        query = ctx.query,
        idx = ctx.current_step_idx,
        step = ctx.current_step_line,
        plan = ctx.plan_summary,
        failures = ctx.failure_summary,
        retries = ctx.retries_used,
        max_retries = ctx.max_retries_per_step,
        replans = ctx.replan_count,
        max_replans = ctx.max_replans,
        constraints = constraints_block,
    )
}

pub fn decompose(goal: &str, prev_failure: Option<&str>) -> String {
    format!(
        "You are a domain-aware research assistant. Your task is to decompose the \
         following high-level research step into a minimal set of atomic, \
         web-searchable subtasks.\n\
         \n\
         Guidelines:\n\
         - Each subtask should be a concise query that could be entered into a search \
           engine to gather factual, relevant information.\n\
         - Do not reference specific documents, websites, or named authors unless they \
           are widely known entities (e.g. Wikipedia, WHO, NASA).\n\
         - Avoid subtasks that are too vague (e.g. \"learn about X\") or too narrow.\n\
         - Do not generate subtasks that involve clarification, introspection, or \
           LLM-only reasoning.\n\
         - Use neutral phrasing and focus on fact-finding, comparisons, definitions, \
           statistics, or causal relationships.\n\
         - Include only as many subtasks as are necessary to cover the plan step.\n\
         - If the step includes context entities from prior steps, use them; you may \
           make one subtask per entity if required.\n\
         \n\
         Plan Step:\n\"{goal}\"\n\
         \n\
         Previous Errors:\n{prev}\n\
         \n\
         Output Format:\n\
         Return only the subtasks as a numbered list.\n\
         Each item should be a single-line query.",
        prev = prev_failure.unwrap_or("None"),
    )
}

pub fn shorten(subtask: &str, limit: usize) -> String {
    format!(
        "Shorten the following sentence to under {limit} characters while preserving \
         its meaning and specificity:\n\n\"{subtask}\""
    )
}

pub fn rank_urls(subtask: &str, urls: &[String], n: usize) -> String {
    let listing = urls
        .iter()
        .enumerate()
        .map(|(i, url)| format!("{}. {}", i + 1, url))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You're evaluating URLs for relevance to the following research subtask:\n\
         \"{subtask}\"\n\
         \n\
         Given these URLs:\n{listing}\n\
         \n\
         Return the numbers of the {n} most relevant URLs in order of usefulness. The \
         URLs should be crawlable, so exclude sites like Reddit, or PDFs, or other \
         non-crawlable content.\n\
         Just return a comma-separated list of numbers (e.g., 2,1,5)."
    )
}

pub fn extract_summary(subtask: &str, content: &str) -> String {
    format!(
        "You are an information extraction agent. Your task is to extract only \
         factual, relevant content from the following web page, based on this \
         research subtask:\n\
         \n\
         Subtask:\n\"{subtask}\"\n\
         \n\
         Instructions:\n\
         - Keep only the sections that are directly relevant to the subtask.\n\
         - Make sure to extract numeric data if it appears.\n\
         - Exclude boilerplate like navigation menus, ads, author bios, subscription \
           prompts, cookie notices, or unrelated sections.\n\
         - Ignore links, images, citations, and formatting; focus on the core \
           informative content.\n\
         - The output should be a clean, readable summary of the key factual \
           information related to the subtask.\n\
         - Do not hallucinate or add information not found in the content.\n\
         \n\
         Page Content:\n\"\"\"\n{content}\n\"\"\"\n\
         \n\
         Cleaned Output:"
    )
}

pub fn score(subtask: &str, result: &str) -> String {
    format!(
        "Evaluate the relevance and quality of the following result for this research \
         subtask:\n\
         \n\
         Subtask:\n\"{subtask}\"\n\
         \n\
         Result:\n\"\"\"\n{result}\n\"\"\"\n\
         \n\
         Score the result on a scale from 0 to 10 based on relevance, completeness, \
         and factual quality.\n\
         \n\
         Scoring guidance:\n\
         - 9-10: directly answers the subtask with clear, detailed factual information.\n\
         - 6-8: mostly relevant and useful, but missing some depth.\n\
         - 3-5: partially related, superficial, or only indirectly useful.\n\
         - 1-2: barely related or mostly noise.\n\
         - 0: irrelevant, incorrect, or empty.\n\
         \n\
         Return only a single integer between 0 and 10. No explanations, text, or \
         formatting."
    )
}

pub fn extract_entities(types: &[String], text: &str) -> String {
    format!(
        "You are an information extraction system.\n\
         \n\
         Your task is to extract structured entities from the text below.\n\
         \n\
         ENTITY TYPES TO EXTRACT:\n{types:?}\n\
         \n\
         RULES:\n\
         - Only extract entities of the specified types.\n\
         - If an entity is not present, return an empty list for that type.\n\
         - Each entity must be a string.\n\
         - Do NOT hallucinate.\n\
         - Do NOT include explanations.\n\
         \n\
         OUTPUT FORMAT (STRICT JSON):\n\
         {{\n  \"<entity_type>\": [\"...\", \"...\"],\n  ...\n}}\n\
         \n\
         TEXT:\n{text}"
    )
}

pub fn estimate(subtask: &str) -> String {
    format!(
        "Real evidence for the following research subtask could not be found. \
         Provide a cautious, clearly-hedged best-effort estimate of the likely \
         answer, based on general knowledge. Keep it short and state the key \
         assumptions.\n\
         \n\
         Subtask:\n\"{subtask}\""
    )
}

pub fn initial_plan(query: &str) -> String {
    format!(
        "You are a research planning agent in a multi-agent system.\n\
         \n\
         Your job is to convert a high-level research query into a SMALL, EXECUTABLE \
         sequence of research steps that can be carried out using external \
         information sources (e.g. web search, reports, datasets).\n\
         \n\
         Research Query:\n{query}\n\
         \n\
         Planning objectives:\n\
         - Decompose the query into concrete, factual sub-questions.\n\
         - Each step should aim to retrieve or analyze real-world information.\n\
         - Prefer steps answerable from public, authoritative sources.\n\
         - Avoid steps that rely on speculation, private data, or judgment.\n\
         \n\
         Step design rules, for EACH step:\n\
         1. The step must be independently executable.\n\
         2. The step must correspond to ONE clear information need.\n\
         3. The step must be feasible via search or simple analysis.\n\
         4. If data availability is uncertain, mark the step as higher risk.\n\
         5. Each step should just be a search for information; don't include \
            analysis steps in the initial plan.\n\
         \n\
         Risk levels:\n\
         - \"low\": data is very likely to exist in public sources.\n\
         - \"medium\": data likely exists but may require synthesis or proxies.\n\
         - \"high\": data may be incomplete, outdated, or unavailable.\n\
         \n\
         OUTPUT FORMAT (STRICT)\n\
         Return ONLY a JSON list (no markdown, no explanation).\n\
         \n\
         Each list element must have EXACTLY these fields:\n\
         - \"id\": short string identifier (e.g. \"s1\", \"s2\")\n\
         - \"goal\": precise description of what the step aims to find or compute\n\
         - \"method\": one of [\"search\", \"analysis\"]\n\
         - \"risk\": one of [\"low\", \"medium\", \"high\"]\n\
         - \"produces_entities\": list of entity-name strings this step produces. \
           Each name should fully describe the data produced \
           (e.g. \"average_annual_rainfall_by_country\"). Can be empty.\n\
         - \"requires_entities\": list of entity-name strings this step requires, \
           matching names produced by prior steps. Can be empty.\n\
         \n\
         IMPORTANT CONSTRAINTS:\n\
         - Do NOT answer the research question.\n\
         - Do NOT include conclusions or explanatory text.\n\
         - Use the minimum number of steps required to answer the query well.\n\
         \n\
         Begin."
    )
}

pub fn replan(
    query: &str,
    failed_step_id: &str,
    failure_reason: &str,
    k: usize,
    completed_steps: &str,
) -> String {
    format!(
        "You are a research planning agent in a multi-agent system.\n\
         \n\
         Your job is to REVISE an existing research plan after a specific failure, \
         by proposing a NEW, EXECUTABLE sequence of steps that replaces ONLY the \
         failed portion of the plan.\n\
         \n\
         Research Query:\n{query}\n\
         \n\
         Context:\n\
         - The plan was partially executed successfully.\n\
         - A specific step FAILED and must NOT be repeated.\n\
         - Steps completed before the failure are correct and MUST remain unchanged.\n\
         \n\
         Failure details:\n\
         - Failed step id: {failed_step_id}\n\
         - Failure reason: {failure_reason}\n\
         - Failure occurred at plan index: {k}\n\
         \n\
         Completed steps (DO NOT MODIFY):\n{completed_steps}\n\
         \n\
         Replanning objectives:\n\
         - Replace ONLY the remaining steps starting at index {k}.\n\
         - Avoid repeating the failed step or closely equivalent steps.\n\
         - Adapt the plan to bypass missing, unavailable, or infeasible data.\n\
         - Preserve the original intent of answering the research query.\n\
         - Prefer alternative metrics, proxies, or authoritative sources.\n\
         \n\
         OUTPUT FORMAT (STRICT)\n\
         Return ONLY a JSON list (no markdown, no explanation).\n\
         \n\
         Each list element must have EXACTLY these fields:\n\
         - \"id\": short string identifier, not reusing completed step ids\n\
         - \"goal\": precise description of what the step aims to find or compute\n\
         - \"method\": one of [\"search\", \"analysis\"]\n\
         - \"risk\": one of [\"low\", \"medium\", \"high\"]\n\
         - \"produces_entities\": list of entity-name strings. Can be empty.\n\
         - \"requires_entities\": list of entity-name strings. Can be empty.\n\
         \n\
         IMPORTANT CONSTRAINTS:\n\
         - Do NOT include the completed steps above.\n\
         - Do NOT answer the research query.\n\
         - Do NOT include conclusions or explanations.\n\
         - Use the minimum number of steps required to complete the plan.\n\
         \n\
         Begin."
    )
}

pub fn clarity(query: &str) -> String {
    format!(
        "You are evaluating the clarity of a user-submitted research query.\n\
         \n\
         Clarity is how specific, interpretable, and actionable the query is for an \
         AI research assistant. A clear query contains enough context, scope, and \
         intent to be processed without follow-up clarification.\n\
         \n\
         Instructions:\n\
         - Return only a float between 0.0 and 1.0.\n\
         - 0.0 = completely vague or ambiguous.\n\
         - 1.0 = perfectly clear and immediately actionable.\n\
         - No explanation, no formatting, only the number.\n\
         \n\
         Scoring guide with examples:\n\
         - 1.0: fully clear, precise, scoped.\n\
         - 0.8: mostly clear, some minor scope ambiguity.\n\
         - 0.6: somewhat clear, but missing key context or constraints.\n\
         - 0.4: vague or broad; lacks specificity or target.\n\
         - 0.2: highly ambiguous, could mean many things.\n\
         - 0.0: nonspecific, contextless, or meaningless.\n\
         \n\
         Query to evaluate:\n{query}"
    )
}

pub const NO_CLARIFICATION_NEEDED: &str = "NO_CLARIFICATION_NEEDED";

pub fn clarification_question(query: &str) -> String {
    format!(
        "You are assisting with a research task. The user's original query is:\n\
         \n\
         User query:\n\"{query}\"\n\
         \n\
         The system has determined that some clarification in the query is needed. \
         Identify the single most critical ambiguity that would materially affect \
         the research outcome, and ask ONE concise clarification question.\n\
         \n\
         Do NOT ask about minor details, formatting preferences, or optional scope \
         extensions. If the query is already sufficiently actionable, return the \
         string \"{NO_CLARIFICATION_NEEDED}\".\n\
         \n\
         Your question (or \"{NO_CLARIFICATION_NEEDED}\"):"
    )
}

pub fn final_report(query: &str, evidence_summary: &str, termination_context: &str) -> String {
    format!(
        "You are a research assistant writing a final report.\n\
         \n\
         Your task is to answer the following research question using ONLY the \
         evidence provided below.\n\
         \n\
         Research Question:\n{query}\n\
         \n\
         You MUST:\n\
         - Directly answer the research question.\n\
         - Base your answer strictly on the provided evidence.\n\
         - Clearly state any uncertainties, missing data, or limitations.\n\
         - Avoid speculation or unsupported claims.\n\
         - Prefer cautious, qualified language where evidence is incomplete.\n\
         \n\
         If evidence is insufficient to fully answer the question, provide a \
         best-effort partial answer and explicitly explain what is missing.\n\
         \n\
         Collected Evidence:\n{evidence_summary}\n\
         \n\
         Termination Context:\n{termination_context}\n\
         \n\
         Write a clear, well-structured report.\n\
         Do NOT mention internal agents, steps, or system details."
    )
}
